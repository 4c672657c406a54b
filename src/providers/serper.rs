//! Serper Google search API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{
    ProviderError, ProviderResponse, ProviderResult, SearchDocument, SearchProvider,
};
use crate::config::ProviderParams;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Serper search API client, document mode only
pub struct SerperHandler {
    api_key: String,
    base_url: String,
    http_client: Client,
    search_params: ProviderParams,
}

impl SerperHandler {
    /// Create a new Serper client
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
        let api_key = std::env::var("SERPER_API_KEY")
            .map_err(|_| ProviderError::Config("SERPER_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, search_params))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for SerperHandler {
    fn name(&self) -> &str {
        "serper"
    }

    fn is_llm_response(&self) -> bool {
        false
    }

    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse> {
        let mut body = serde_json::Map::new();
        body.insert("q".to_string(), Value::String(query.to_string()));
        for (key, value) in &self.search_params {
            body.insert(key.clone(), value.clone());
        }

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
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
        let parsed: SerperResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Parse(format!("serper payload: {}", e)))?;

        let mut documents = Vec::new();
        for result in parsed.organic {
            let content = if !result.title.is_empty() && !result.snippet.is_empty() {
                format!("{}\n{}", result.title, result.snippet)
            } else if !result.title.is_empty() {
                result.title
            } else {
                result.snippet
            };
            // Entries without a link or any text contribute nothing
            if !result.link.is_empty() && !content.is_empty() {
                documents.push(SearchDocument::new(result.link, content));
            }
        }

        Ok(ProviderResponse::from_documents(documents, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_composes_title_and_snippet() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"organic":[
                    {"link":"https://a","title":"T","snippet":"S"},
                    {"link":"https://b","title":"Only title","snippet":""},
                    {"link":"","title":"dropped","snippet":"no link"},
                    {"link":"https://c","title":"","snippet":""}
                ]}"#,
            )
            .create_async()
            .await;

        let handler =
            SerperHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());
        let response = handler.search("test").await.unwrap();

        assert_eq!(
            response.documents,
            vec![
                SearchDocument::new("https://a", "T\nS"),
                SearchDocument::new("https://b", "Only title"),
            ]
        );
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;

        let handler =
            SerperHandler::new("key".to_string(), ProviderParams::new()).with_base_url(server.url());

        match handler.search("test").await {
            Err(ProviderError::Api { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected API error, got {:?}", other.map(|r| r.answer)),
        }
    }
}
