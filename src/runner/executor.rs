//! Concurrent evaluation pipeline

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::dataset::Example;
use crate::judge::{AnswerExtractor, AnswerGrader};
use crate::providers::{render_document_context, ProviderResult, SearchProvider};
use crate::reporting::store::{accuracy, EvaluationRecord, RecordLog};

/// Configuration for the evaluation executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum in-flight examples per provider; values below 1 run as 1
    pub parallel_requests: usize,
    /// Evaluate providers one at a time instead of concurrently
    pub sequential_providers: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_requests: 8,
            sequential_providers: false,
        }
    }
}

/// One provider's evaluation workload
pub struct EvaluationJob {
    pub provider: Arc<dyn SearchProvider + Send + Sync>,
    pub log: Arc<RecordLog>,
    pub examples: Vec<Example>,
}

/// Aggregate outcome for one provider over the examples scheduled this run
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub provider: String,
    pub results: Vec<EvaluationRecord>,
    pub accuracy: f64,
    pub correct_count: usize,
    pub total_count: usize,
}

/// Executor driving the search, extraction, and grading pipeline
pub struct Executor {
    extractor: Arc<dyn AnswerExtractor>,
    grader: Arc<dyn AnswerGrader>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(
        extractor: Arc<dyn AnswerExtractor>,
        grader: Arc<dyn AnswerGrader>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            extractor,
            grader,
            config,
        }
    }

    /// Evaluate all jobs and return one report per job, in job order
    pub async fn run(&self, jobs: &[EvaluationJob]) -> Vec<ProviderReport> {
        if self.config.sequential_providers {
            let mut reports = Vec::with_capacity(jobs.len());
            for job in jobs {
                reports.push(self.evaluate_provider(job).await);
            }
            reports
        } else {
            let futures: Vec<_> = jobs.iter().map(|job| self.evaluate_provider(job)).collect();
            futures::future::join_all(futures).await
        }
    }

    /// Run every scheduled example of one job through the pipeline.
    ///
    /// Examples run concurrently up to `parallel_requests`; each outcome is
    /// appended to the job's record log as it completes. A failed example
    /// produces an ERROR record and never aborts its siblings.
    pub async fn evaluate_provider(&self, job: &EvaluationJob) -> ProviderReport {
        let provider_name = job.provider.name().to_string();
        let total_count = job.examples.len();
        tracing::info!("[{}] Evaluating {} examples", provider_name, total_count);

        // A cap of zero would never grant a permit
        let permits = self.config.parallel_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = FuturesUnordered::new();

        for example in job.examples.clone() {
            let provider = job.provider.clone();
            let extractor = self.extractor.clone();
            let grader = self.grader.clone();
            let log = job.log.clone();
            let semaphore = semaphore.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                process_example(provider, extractor, grader, log, example).await
            }));
        }

        let mut results = Vec::with_capacity(total_count);
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(record) => results.push(record),
                Err(e) => tracing::error!("[{}] Example task panicked: {}", provider_name, e),
            }
        }

        let correct_count = results.iter().filter(|record| record.is_correct).count();
        ProviderReport {
            provider: provider_name,
            accuracy: accuracy(correct_count, total_count),
            correct_count,
            total_count,
            results,
        }
    }
}

/// Evaluate one example and persist the outcome. Failures anywhere in the
/// pipeline become an ERROR record so the example can be retried on resume.
async fn process_example(
    provider: Arc<dyn SearchProvider + Send + Sync>,
    extractor: Arc<dyn AnswerExtractor>,
    grader: Arc<dyn AnswerGrader>,
    log: Arc<RecordLog>,
    example: Example,
) -> EvaluationRecord {
    let record = match grade_example(&*provider, &*extractor, &*grader, &example).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(
                "[{}] Error evaluating example {}: {}",
                provider.name(),
                example.index,
                e
            );
            EvaluationRecord::failed(&example, e.to_string())
        }
    };

    if let Err(e) = log.append(&record).await {
        tracing::error!(
            "[{}] Failed to persist record for example {}: {}",
            provider.name(),
            example.index,
            e
        );
    }

    record
}

async fn grade_example(
    provider: &dyn SearchProvider,
    extractor: &dyn AnswerExtractor,
    grader: &dyn AnswerGrader,
    example: &Example,
) -> ProviderResult<EvaluationRecord> {
    let response = provider.search(&example.question).await?;

    let search_answer = if provider.is_llm_response() {
        response.answer
    } else {
        render_document_context(&response.documents)
    };

    let predicted_answer = extractor
        .extract(&example.question, provider.is_llm_response(), &search_answer)
        .await;

    let verdict = grader
        .evaluate(&example.question, &predicted_answer, &example.reference_answer)
        .await?;

    let is_correct = verdict.score == 1.0;
    tracing::info!(
        "[{}] Q{}: Grade - {}, Query: '{}'",
        provider.name(),
        example.index,
        verdict.grade,
        example.question
    );

    Ok(EvaluationRecord::graded(
        example,
        predicted_answer,
        is_correct,
        verdict.grade,
    ))
}
