//! Search provider implementations

pub mod brave;
pub mod exa;
pub mod perplexity;
pub mod serper;
pub mod tavily;
pub mod traits;

pub use brave::BraveHandler;
pub use exa::ExaHandler;
pub use perplexity::PerplexityHandler;
pub use serper::SerperHandler;
pub use tavily::TavilyHandler;
pub use traits::{
    render_document_context, ProviderError, ProviderResponse, ProviderResult, SearchDocument,
    SearchProvider,
};

use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;

/// Provider identifiers recognized by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Tavily,
    Exa,
    Perplexity,
    Brave,
    Serper,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Tavily => "tavily",
            ProviderKind::Exa => "exa",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::Brave => "brave",
            ProviderKind::Serper => "serper",
        }
    }

    pub fn all() -> Vec<ProviderKind> {
        vec![
            ProviderKind::Tavily,
            ProviderKind::Exa,
            ProviderKind::Perplexity,
            ProviderKind::Brave,
            ProviderKind::Serper,
        ]
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tavily" => Ok(ProviderKind::Tavily),
            "exa" => Ok(ProviderKind::Exa),
            "perplexity" => Ok(ProviderKind::Perplexity),
            "brave" => Ok(ProviderKind::Brave),
            "serper" => Ok(ProviderKind::Serper),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Create one handler per recognized provider in the config, preserving
/// config order. Unrecognized names are skipped with a warning; a recognized
/// provider whose API key is missing is a configuration error.
pub fn create_providers(
    config: &Config,
) -> ProviderResult<Vec<Arc<dyn SearchProvider + Send + Sync>>> {
    let mut providers: Vec<Arc<dyn SearchProvider + Send + Sync>> = Vec::new();

    for (name, params) in &config.providers {
        let kind = match name.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!("Skipping unknown provider in config: {}", name);
                continue;
            }
        };

        let provider: Arc<dyn SearchProvider + Send + Sync> = match kind {
            ProviderKind::Tavily => Arc::new(TavilyHandler::from_env(params.clone())?),
            ProviderKind::Exa => Arc::new(ExaHandler::from_env(params.clone())?),
            ProviderKind::Perplexity => Arc::new(PerplexityHandler::from_env(params.clone())?),
            ProviderKind::Brave => Arc::new(BraveHandler::from_env(params.clone())?),
            ProviderKind::Serper => Arc::new(SerperHandler::from_env(params.clone())?),
        };
        providers.push(provider);
    }

    Ok(providers)
}
