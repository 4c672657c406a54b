//! Correctness grading against reference answers

use async_trait::async_trait;
use regex::Regex;

use super::client::JudgeClient;
use crate::providers::{ProviderError, ProviderResult};

const GRADING_PROMPT: &str = r#"You are grading a candidate answer to a question against a reference answer.

## Question:
{question}

## Reference answer:
{reference}

## Candidate answer:
{candidate}

Decide whether the candidate answer is factually consistent with the reference answer. Differences in wording, formatting, or level of detail do not matter; the stated facts must match.

Respond with exactly one word: CORRECT or INCORRECT."#;

/// Verdict produced by grading one predicted answer
#[derive(Debug, Clone, PartialEq)]
pub struct GradeVerdict {
    /// 1.0 for a correct answer, 0.0 otherwise
    pub score: f64,
    /// Canonical grade label, "CORRECT" or "INCORRECT"
    pub grade: String,
}

/// Judges predicted answers against the dataset reference
#[async_trait]
pub trait AnswerGrader: Send + Sync {
    async fn evaluate(
        &self,
        question: &str,
        predicted_answer: &str,
        reference_answer: &str,
    ) -> ProviderResult<GradeVerdict>;
}

/// Grader backed by the judge model
pub struct LlmGrader {
    client: JudgeClient,
}

impl LlmGrader {
    pub fn new(client: JudgeClient) -> Self {
        Self { client }
    }

    /// Parse the judge's free-form reply into a verdict. An unrecognizable
    /// reply is an error so the example is recorded as failed, not as wrong.
    fn parse_verdict(response: &str) -> ProviderResult<GradeVerdict> {
        // Word-bounded so CORRECT never matches inside INCORRECT
        let re = Regex::new(r"(?i)\b(INCORRECT|CORRECT)\b").unwrap();

        let label = re
            .find(response)
            .map(|m| m.as_str().to_uppercase())
            .ok_or_else(|| {
                ProviderError::Parse(format!("Unrecognized grading verdict: {}", response.trim()))
            })?;

        let score = if label == "CORRECT" { 1.0 } else { 0.0 };
        Ok(GradeVerdict { score, grade: label })
    }
}

#[async_trait]
impl AnswerGrader for LlmGrader {
    async fn evaluate(
        &self,
        question: &str,
        predicted_answer: &str,
        reference_answer: &str,
    ) -> ProviderResult<GradeVerdict> {
        let prompt = GRADING_PROMPT
            .replace("{question}", question)
            .replace("{reference}", reference_answer)
            .replace("{candidate}", predicted_answer);

        let response = self.client.complete(&prompt).await?;
        Self::parse_verdict(&response)
    }
}
