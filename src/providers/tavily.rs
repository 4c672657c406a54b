//! Tavily search API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{
    ProviderError, ProviderResponse, ProviderResult, SearchDocument, SearchProvider,
};
use crate::config::ProviderParams;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search API client.
///
/// Runs in answer mode when the configured parameters set
/// `include_answer = true`, otherwise returns retrieved documents.
pub struct TavilyHandler {
    api_key: String,
    base_url: String,
    http_client: Client,
    search_params: ProviderParams,
    is_llm_response: bool,
}

impl TavilyHandler {
    /// Create a new Tavily client
    pub fn new(api_key: String, search_params: ProviderParams) -> Self {
        let is_llm_response = search_params
            .get("include_answer")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            search_params,
            is_llm_response,
        }
    }

    /// Create from environment variable
    pub fn from_env(search_params: ProviderParams) -> ProviderResult<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ProviderError::Config("TAVILY_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, search_params))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    content: String,
}

#[async_trait]
impl SearchProvider for TavilyHandler {
    fn name(&self) -> &str {
        "tavily"
    }

    fn is_llm_response(&self) -> bool {
        self.is_llm_response
    }

    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse> {
        let mut body = serde_json::Map::new();
        body.insert("query".to_string(), Value::String(query.to_string()));
        body.insert("api_key".to_string(), Value::String(self.api_key.clone()));
        for (key, value) in &self.search_params {
            body.insert(key.clone(), value.clone());
        }

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
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
        let parsed: TavilyResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Parse(format!("tavily payload: {}", e)))?;

        if self.is_llm_response {
            Ok(ProviderResponse::from_answer(
                parsed.answer.unwrap_or_default(),
                raw,
            ))
        } else {
            let documents = parsed
                .results
                .into_iter()
                .map(|r| SearchDocument::new(r.url, r.content))
                .collect();
            Ok(ProviderResponse::from_documents(documents, raw))
        }
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
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"url":"https://a","content":"X"},{"url":"https://b","content":"Y"}]}"#,
            )
            .create_async()
            .await;

        let handler =
            TavilyHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());
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
    async fn test_answer_mode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"Paris.","results":[]}"#)
            .create_async()
            .await;

        let mut params = ProviderParams::new();
        params.insert("include_answer".to_string(), Value::Bool(true));

        let handler = TavilyHandler::new("key".to_string(), params).with_base_url(server.url());
        assert!(handler.is_llm_response());

        let response = handler.search("capital of France").await.unwrap();
        assert_eq!(response.answer, "Paris.");
        assert!(response.documents.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let handler =
            TavilyHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());

        match handler.search("test").await {
            Err(ProviderError::Api { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected API error, got {:?}", other.map(|r| r.answer)),
        }
    }
}
