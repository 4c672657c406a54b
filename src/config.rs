//! Provider configuration loading

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Search parameters for one provider, passed through to its request payload
pub type ProviderParams = serde_json::Map<String, Value>;

/// Benchmark configuration: an ordered map from provider name to its search
/// parameters. Order is preserved so runs evaluate providers in the order
/// the config lists them.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: IndexMap<String, ProviderParams>,
}

impl Default for Config {
    fn default() -> Self {
        // Fallback used when no config file is supplied: Tavily with an
        // advanced document search
        let mut params = ProviderParams::new();
        params.insert("depth".to_string(), Value::String("advanced".to_string()));
        params.insert("include_raw_content".to_string(), Value::Bool(true));
        params.insert("max_results".to_string(), Value::from(10));

        let mut providers = IndexMap::new();
        providers.insert("tavily".to_string(), params);
        Self { providers }
    }
}

impl Config {
    /// Load configuration from a file, dispatching on the extension.
    /// `.json` files use the legacy flat layout; everything else parses as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Parse TOML configuration with `[providers.<name>]` tables
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse the legacy flat JSON layout, a single object mapping provider
    /// names directly to their parameters
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let providers: IndexMap<String, ProviderParams> =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self { providers })
    }

    /// Load from the given path, or fall back to the default configuration
    /// when no path is supplied
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                tracing::info!("Loaded provider configuration from {}", path.display());
                Ok(config)
            }
            None => {
                tracing::info!("No configuration file given, using default Tavily setup");
                Ok(Self::default())
            }
        }
    }

    /// Starter configuration written by `init-config`: the default Tavily
    /// setup active, the remaining providers commented out.
    pub fn sample() -> String {
        r#"# Provider configuration. Each [providers.<name>] table is passed through
# to that provider's search request. API keys are read from the environment:
# TAVILY_API_KEY, EXA_API_KEY, PERPLEXITY_API_KEY, BRAVE_API_KEY, SERPER_API_KEY.

[providers.tavily]
depth = "advanced"
include_raw_content = true
max_results = 10

# [providers.exa]
# numResults = 10

# [providers.perplexity]
# model = "sonar-pro"

# [providers.brave]
# count = 10

# [providers.serper]
# num = 10
"#
        .to_string()
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
