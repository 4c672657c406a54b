//! Evaluation execution

pub mod executor;

pub use executor::{EvaluationJob, Executor, ExecutorConfig, ProviderReport};
