//! Provider trait definitions for search API clients

use async_trait::async_trait;
use serde_json::Value;

/// A single retrieved document in canonical form
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub url: String,
    pub content: String,
}

impl SearchDocument {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }
}

/// Response from a search provider.
///
/// Exactly one of `answer` and `documents` is populated, depending on whether
/// the provider synthesizes answers or returns retrieved documents.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    /// Final answer text, for providers that synthesize one
    pub answer: String,
    /// Retrieved documents in provider relevance order
    pub documents: Vec<SearchDocument>,
    /// Raw provider payload, kept for auditing
    pub raw: Option<Value>,
}

impl ProviderResponse {
    pub fn from_answer(answer: impl Into<String>, raw: Value) -> Self {
        Self {
            answer: answer.into(),
            documents: Vec::new(),
            raw: Some(raw),
        }
    }

    pub fn from_documents(documents: Vec<SearchDocument>, raw: Value) -> Self {
        Self {
            answer: String::new(),
            documents,
            raw: Some(raw),
        }
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get the canonical provider name (e.g., "tavily", "exa", "perplexity")
    fn name(&self) -> &str;

    /// Whether search responses already carry a synthesized answer
    fn is_llm_response(&self) -> bool;

    /// Run one search for the given query
    async fn search(&self, query: &str) -> ProviderResult<ProviderResponse>;
}

/// Render retrieved documents into the numbered context block handed to the
/// extraction model. Document numbering starts at 1.
pub fn render_document_context(documents: &[SearchDocument]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "\n**Document {}.** Source: {}\nContent: {}",
                i + 1,
                doc.url,
                doc.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_document_context() {
        let docs = vec![
            SearchDocument::new("https://a", "X"),
            SearchDocument::new("https://b", "Y"),
        ];
        assert_eq!(
            render_document_context(&docs),
            "\n**Document 1.** Source: https://a\nContent: X\n\n**Document 2.** Source: https://b\nContent: Y"
        );
    }

    #[test]
    fn test_render_empty_document_list() {
        assert_eq!(render_document_context(&[]), "");
    }
}
