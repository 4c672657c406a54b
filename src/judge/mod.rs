//! Judge model: answer extraction and grading

pub mod client;
pub mod extractor;
pub mod grader;

pub use client::JudgeClient;
pub use extractor::{AnswerExtractor, LlmExtractor, EXTRACTION_FAILURE_ANSWER};
pub use grader::{AnswerGrader, GradeVerdict, LlmGrader};
