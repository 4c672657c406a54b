//! Exa search API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{
    ProviderError, ProviderResponse, ProviderResult, SearchDocument, SearchProvider,
};
use crate::config::ProviderParams;

const DEFAULT_BASE_URL: &str = "https://api.exa.ai";

/// Exa search API client, document mode only
pub struct ExaHandler {
    api_key: String,
    base_url: String,
    http_client: Client,
    search_params: ProviderParams,
}

impl ExaHandler {
    /// Create a new Exa client
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
        let api_key = std::env::var("EXA_API_KEY")
            .map_err(|_| ProviderError::Config("EXA_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, search_params))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Deserialize)]
struct ExaResult {
    url: String,
    text: String,
}

#[async_trait]
impl SearchProvider for ExaHandler {
    fn name(&self) -> &str {
        "exa"
    }

    fn is_llm_response(&self) -> bool {
        false
    }

    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse> {
        let mut body = serde_json::Map::new();
        body.insert("query".to_string(), Value::String(query.to_string()));
        for (key, value) in &self.search_params {
            body.insert(key.clone(), value.clone());
        }

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&Value::Object(body))
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
        let parsed: ExaResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Parse(format!("exa payload: {}", e)))?;

        let documents = parsed
            .results
            .into_iter()
            .map(|r| SearchDocument::new(r.url, r.text))
            .collect();
        Ok(ProviderResponse::from_documents(documents, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_search() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("x-api-key", "key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"url":"https://a","text":"X"},{"url":"https://b","text":"Y"}]}"#,
            )
            .create_async()
            .await;

        let handler =
            ExaHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());
        assert!(!handler.is_llm_response());

        let response = handler.search("test query").await.unwrap();
        assert_eq!(
            response.documents,
            vec![
                SearchDocument::new("https://a", "X"),
                SearchDocument::new("https://b", "Y"),
            ]
        );
        assert!(response.answer.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let handler =
            ExaHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());

        match handler.search("test").await {
            Err(ProviderError::Api { status, .. }) => assert_eq!(status, 401),
            other => panic!("Expected API error, got {:?}", other.map(|r| r.answer)),
        }
    }
}
