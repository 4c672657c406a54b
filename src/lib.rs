//! Accuracy Benchmark for Search and Research Providers
//!
//! This crate evaluates answer-providing services, web search APIs and LLM
//! research tools alike, against a reference question/answer dataset. Each
//! question is sent to every configured provider, the provider's output is
//! distilled to a short final answer by an extraction model, graded against
//! the reference answer by a judge model, and streamed to per-provider CSV
//! record logs that interrupted runs can resume from.
//!
//! # Features
//!
//! - Tavily, Exa, Perplexity, Brave, and Serper provider handlers
//! - Uniform pipeline over answer-mode and document-mode providers
//! - Bounded per-provider concurrency with parallel or sequential provider runs
//! - Append-only record logs with resume that retries only failed examples
//! - Cross-provider accuracy summary recomputed from the logs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qa_benchmark::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Providers from config and environment
//!     let config = Config::default();
//!     let providers = create_providers(&config)?;
//!
//!     // Dataset and per-run store
//!     let examples = load_dataset("datasets/simple_qa_test_set.csv".as_ref(), 0, None, None)?;
//!     let store = ResultStore::open("results/run")?;
//!
//!     // Judge model drives extraction and grading
//!     let judge = JudgeClient::from_env()?;
//!     let executor = Executor::new(
//!         Arc::new(LlmExtractor::new(judge.clone())),
//!         Arc::new(LlmGrader::new(judge)),
//!         ExecutorConfig::default(),
//!     );
//!
//!     let jobs: Vec<EvaluationJob> = providers
//!         .into_iter()
//!         .map(|provider| {
//!             let log = store.record_log(provider.name());
//!             EvaluationJob { provider, log, examples: examples.clone() }
//!         })
//!         .collect();
//!
//!     let reports = executor.run(&jobs).await;
//!     let names: Vec<String> = reports.iter().map(|r| r.provider.clone()).collect();
//!     store.write_summary(&names)?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod csvio;
pub mod dataset;
pub mod judge;
pub mod providers;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{Config, ProviderParams};
    pub use crate::dataset::{load_dataset, Example, LoadError};
    pub use crate::judge::{
        AnswerExtractor, AnswerGrader, GradeVerdict, JudgeClient, LlmExtractor, LlmGrader,
    };
    pub use crate::providers::{
        create_providers, ProviderError, ProviderKind, ProviderResponse, ProviderResult,
        SearchDocument, SearchProvider,
    };
    pub use crate::reporting::{
        print_results, print_summary, run_directory, EvaluationRecord, RecordLog, ResultStore,
        SummaryRow,
    };
    pub use crate::runner::{EvaluationJob, Executor, ExecutorConfig, ProviderReport};
}
