//! Answer extraction from provider output

use async_trait::async_trait;

use super::client::JudgeClient;

/// Fallback answer recorded when extraction fails; graded like any other
/// prediction rather than aborting the example.
pub const EXTRACTION_FAILURE_ANSWER: &str = "Sorry, I couldn't process the answer properly.";

const ANSWER_PROMPT: &str = r#"You are an advanced assistant operating in strict extraction mode.
Your mission is **extremely important**: extract **only** the **direct, final answer** to the user's query, based solely on the provided response.

## Rules (non-negotiable):
- Do **not** explain, paraphrase, summarize, or add any context.
- Return **only** the final answer — nothing else.

## Query:
{query}

## Response:
{response}

Now return the single, most accurate answer to the query."#;

const DOCUMENTS_PROMPT: &str = r#"You are an advanced assistant operating in strict extraction mode.
Your mission is **extremely important**: extract **only** the **direct, final answer** to the user's query, based solely on the provided list of documents. Each document includes a `URL` and `Content`.

## Rules (non-negotiable):
- Do **not** explain, paraphrase, summarize, or add any context.
- Return **only** the final answer — nothing else.
- If multiple documents suggest different answers, choose the one from the **most reliable URL** (e.g., Wikipedia, .gov, .edu, official sources).

## Query:
{query}

## Documents list:
{documents}

Now return the single, most accurate answer to the query."#;

/// Distills provider output into a short final answer
#[async_trait]
pub trait AnswerExtractor: Send + Sync {
    /// Extract the final answer to `query` from `content`, which is either a
    /// synthesized provider answer or a rendered document context block.
    async fn extract(&self, query: &str, is_llm_response: bool, content: &str) -> String;
}

/// Extractor backed by the judge model
pub struct LlmExtractor {
    client: JudgeClient,
}

impl LlmExtractor {
    pub fn new(client: JudgeClient) -> Self {
        Self { client }
    }

    fn build_prompt(query: &str, is_llm_response: bool, content: &str) -> String {
        if is_llm_response {
            ANSWER_PROMPT
                .replace("{query}", query)
                .replace("{response}", content)
        } else {
            DOCUMENTS_PROMPT
                .replace("{query}", query)
                .replace("{documents}", content)
        }
    }
}

#[async_trait]
impl AnswerExtractor for LlmExtractor {
    async fn extract(&self, query: &str, is_llm_response: bool, content: &str) -> String {
        tracing::debug!("Extracting answer for query: {}", query);
        let prompt = Self::build_prompt(query, is_llm_response, content);

        match self.client.complete(&prompt).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                tracing::error!("Error extracting answer: {}", e);
                EXTRACTION_FAILURE_ANSWER.to_string()
            }
        }
    }
}
