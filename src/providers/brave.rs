//! Brave web search API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{
    ProviderError, ProviderResponse, ProviderResult, SearchDocument, SearchProvider,
};
use crate::config::ProviderParams;

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Brave web search API client, document mode only
pub struct BraveHandler {
    api_key: String,
    base_url: String,
    http_client: Client,
    search_params: ProviderParams,
}

impl BraveHandler {
    /// Create a new Brave client
    pub fn new(api_key: String, search_params: ProviderParams) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            search_params,
        }
    }

    /// Create from environment variable
    pub fn from_env(search_params: ProviderParams) -> ProviderResult<Self> {
        let api_key = std::env::var("BRAVE_API_KEY")
            .map_err(|_| ProviderError::Config("BRAVE_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, search_params))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct BraveResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for BraveHandler {
    fn name(&self) -> &str {
        "brave"
    }

    fn is_llm_response(&self) -> bool {
        false
    }

    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse> {
        let mut query_pairs = vec![("q".to_string(), query.to_string())];
        for (key, value) in &self.search_params {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            query_pairs.push((key.clone(), rendered));
        }

        let response = self
            .http_client
            .get(format!("{}/web/search", self.base_url))
            .query(&query_pairs)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw: Value = response.json().await?;
        let parsed: BraveResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Parse(format!("brave payload: {}", e)))?;

        let mut documents = Vec::new();
        if let Some(web) = parsed.web {
            for result in web.results {
                let content = if !result.title.is_empty() && !result.description.is_empty() {
                    format!("{}\n{}", result.title, result.description)
                } else if !result.title.is_empty() {
                    result.title
                } else {
                    result.description
                };
                // Entries without a URL or any text contribute nothing
                if !result.url.is_empty() && !content.is_empty() {
                    documents.push(SearchDocument::new(result.url, content));
                }
            }
        }

        Ok(ProviderResponse::from_documents(documents, raw))
    }
}
