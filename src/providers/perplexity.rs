//! Perplexity Sonar API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::{ProviderError, ProviderResponse, ProviderResult, SearchProvider};
use crate::config::ProviderParams;

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_MODEL: &str = "sonar-pro";

/// Perplexity chat completions client.
///
/// Always runs in answer mode: the response is a synthesized answer with
/// citation URLs appended as a source list.
pub struct PerplexityHandler {
    api_key: String,
    base_url: String,
    http_client: Client,
    model: String,
}

impl PerplexityHandler {
    /// Create a new Perplexity client
    pub fn new(api_key: String, search_params: ProviderParams) -> Self {
        let model = search_params
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            model,
        }
    }

    /// Create from environment variable
    pub fn from_env(search_params: ProviderParams) -> ProviderResult<Self> {
        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .map_err(|_| ProviderError::Config("PERPLEXITY_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, search_params))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct PerplexityRequest {
    model: String,
    messages: Vec<PerplexityMessage>,
}

#[derive(Serialize)]
struct PerplexityMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct PerplexityChoice {
    #[serde(default)]
    message: PerplexityChoiceMessage,
}

#[derive(Deserialize, Default)]
struct PerplexityChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchProvider for PerplexityHandler {
    fn name(&self) -> &str {
        "perplexity"
    }

    fn is_llm_response(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse> {
        let body = PerplexityRequest {
            model: self.model.clone(),
            messages: vec![
                PerplexityMessage {
                    role: "system".to_string(),
                    content: "Be precise and concise.".to_string(),
                },
                PerplexityMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
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
        let parsed: PerplexityResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Parse(format!("perplexity payload: {}", e)))?;

        let mut answer = String::new();
        for choice in &parsed.choices {
            answer.push_str(&choice.message.content);
        }

        if !parsed.citations.is_empty() {
            let mut sources = String::new();
            for (i, citation) in parsed.citations.iter().enumerate() {
                sources.push_str(&format!("[{}] {}\n", i + 1, citation));
            }
            answer.push_str(&format!("\nSources:\n{}", sources));
        }

        Ok(ProviderResponse::from_answer(answer, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_answer_with_citations() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "sonar-pro"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "choices":[{"message":{"role":"assistant","content":"Paris."}}],
                    "citations":["https://en.wikipedia.org/wiki/Paris","https://example.com"]
                }"#,
            )
            .create_async()
            .await;

        let handler = PerplexityHandler::new("key".to_string(), ProviderParams::new())
            .with_base_url(server.url());
        assert!(handler.is_llm_response());

        let response = handler.search("capital of France").await.unwrap();
        assert_eq!(
            response.answer,
            "Paris.\nSources:\n[1] https://en.wikipedia.org/wiki/Paris\n[2] https://example.com\n"
        );
    }

    #[tokio::test]
    async fn test_model_override_from_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "sonar"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let mut params = ProviderParams::new();
        params.insert("model".to_string(), Value::String("sonar".to_string()));

        let handler =
            PerplexityHandler::new("key".to_string(), params).with_base_url(server.url());
        let response = handler.search("test").await.unwrap();
        assert_eq!(response.answer, "ok");
        mock.assert_async().await;
    }
}
