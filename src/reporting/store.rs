//! Durable record logs, resume filtering, and run summaries

use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;

use crate::csvio;
use crate::dataset::Example;

/// Grade recorded for examples that failed before grading completed
pub const ERROR_GRADE: &str = "ERROR";

const RECORD_HEADER: [&str; 7] = [
    "index",
    "question",
    "reference_answer",
    "predicted_answer",
    "is_correct",
    "grade",
    "error",
];

const SUMMARY_HEADER: [&str; 5] = [
    "provider",
    "accuracy",
    "correct_count",
    "total_count",
    "timestamp",
];

/// Outcome of evaluating one example against one provider
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub index: u32,
    pub question: String,
    pub reference_answer: String,
    pub predicted_answer: String,
    pub is_correct: bool,
    pub grade: String,
    pub error: Option<String>,
}

impl EvaluationRecord {
    /// Record for a successfully graded example
    pub fn graded(
        example: &Example,
        predicted_answer: String,
        is_correct: bool,
        grade: String,
    ) -> Self {
        Self {
            index: example.index,
            question: example.question.clone(),
            reference_answer: example.reference_answer.clone(),
            predicted_answer,
            is_correct,
            grade,
            error: None,
        }
    }

    /// Record for an example whose pipeline failed. Marked with the ERROR
    /// grade so a resumed run schedules it again.
    pub fn failed(example: &Example, error: String) -> Self {
        Self {
            index: example.index,
            question: example.question.clone(),
            reference_answer: example.reference_answer.clone(),
            predicted_answer: ERROR_GRADE.to_string(),
            is_correct: false,
            grade: ERROR_GRADE.to_string(),
            error: Some(error),
        }
    }

    fn to_row(&self) -> String {
        let index = self.index.to_string();
        let is_correct = self.is_correct.to_string();
        csvio::encode_row(&[
            index.as_str(),
            self.question.as_str(),
            self.reference_answer.as_str(),
            self.predicted_answer.as_str(),
            is_correct.as_str(),
            self.grade.as_str(),
            self.error.as_deref().unwrap_or(""),
        ])
    }

    fn from_row(row: &[String]) -> Option<Self> {
        if row.len() < 6 {
            return None;
        }
        Some(Self {
            index: row[0].parse().ok()?,
            question: row[1].clone(),
            reference_answer: row[2].clone(),
            predicted_answer: row[3].clone(),
            is_correct: row[4].eq_ignore_ascii_case("true"),
            grade: row[5].clone(),
            error: row.get(6).filter(|e| !e.is_empty()).cloned(),
        })
    }
}

/// Append-only record log for one provider.
///
/// The internal lock serializes concurrent example tasks so rows never
/// interleave. Obtain logs through [`ResultStore::record_log`], which hands
/// out one shared instance per provider.
pub struct RecordLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RecordLog {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is new
    pub async fn append(&self, record: &EvaluationRecord) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = String::new();
        if is_new {
            buf.push_str(&csvio::encode_row(&RECORD_HEADER));
        }
        buf.push_str(&record.to_row());

        file.write_all(buf.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// All records currently in the log; a missing file reads as empty
    pub fn read_records(&self) -> std::io::Result<Vec<EvaluationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut rows = csvio::parse_rows(&content);
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        rows.remove(0); // header

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match EvaluationRecord::from_row(row) {
                Some(record) => records.push(record),
                None => tracing::warn!("Skipping malformed row in {}", self.path.display()),
            }
        }
        Ok(records)
    }
}

/// One provider row of the run summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub provider: String,
    pub accuracy: f64,
    pub correct_count: usize,
    pub total_count: usize,
}

/// Per-run store holding provider record logs and the cross-provider summary
pub struct ResultStore {
    dir: PathBuf,
    logs: std::sync::Mutex<HashMap<String, Arc<RecordLog>>>,
}

impl ResultStore {
    /// Open the store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            logs: std::sync::Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Shared record log for one provider. Repeated calls return the same
    /// instance so appends from sibling tasks share a lock.
    pub fn record_log(&self, provider: &str) -> Arc<RecordLog> {
        let mut logs = self.logs.lock().unwrap();
        logs.entry(provider.to_string())
            .or_insert_with(|| {
                Arc::new(RecordLog::new(
                    self.dir.join(format!("{}_results.csv", provider)),
                ))
            })
            .clone()
    }

    /// Examples still pending for a provider under the resume rules.
    ///
    /// A fresh run, a random-sample request, or a missing log schedules
    /// everything. Otherwise indices already recorded with a non-ERROR grade
    /// are skipped, so resume retries failures without redoing finished work.
    pub fn pending_examples(
        &self,
        provider: &str,
        examples: &[Example],
        resume: bool,
        random_sample: bool,
    ) -> std::io::Result<Vec<Example>> {
        let log = self.record_log(provider);
        if !resume || random_sample || !log.path().exists() {
            return Ok(examples.to_vec());
        }

        let completed: HashSet<u32> = log
            .read_records()?
            .into_iter()
            .filter(|record| record.grade != ERROR_GRADE)
            .map(|record| record.index)
            .collect();

        let pending: Vec<Example> = examples
            .iter()
            .filter(|example| !completed.contains(&example.index))
            .cloned()
            .collect();

        tracing::info!(
            "[{}] {} examples already completed, {} pending",
            provider,
            completed.len(),
            pending.len()
        );
        Ok(pending)
    }

    /// Recompute and write `summary.csv` from the named providers' record
    /// logs. Duplicate indices left by resumed runs count once, latest row
    /// wins, so a retried failure is scored by its final outcome.
    pub fn write_summary(&self, providers: &[String]) -> std::io::Result<Vec<SummaryRow>> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut rows = Vec::with_capacity(providers.len());
        let mut out = String::new();
        out.push_str(&csvio::encode_row(&SUMMARY_HEADER));

        for provider in providers {
            let row = self.summarize_provider(provider)?;
            // Whole accuracies keep a decimal point in the file (1.0, not 1)
            let accuracy = if row.accuracy.fract() == 0.0 {
                format!("{:.1}", row.accuracy)
            } else {
                row.accuracy.to_string()
            };
            let correct_count = row.correct_count.to_string();
            let total_count = row.total_count.to_string();
            out.push_str(&csvio::encode_row(&[
                row.provider.as_str(),
                accuracy.as_str(),
                correct_count.as_str(),
                total_count.as_str(),
                timestamp.as_str(),
            ]));
            rows.push(row);
        }

        let path = self.dir.join("summary.csv");
        std::fs::write(&path, out)?;
        tracing::info!("Saved summary to {}", path.display());
        Ok(rows)
    }

    fn summarize_provider(&self, provider: &str) -> std::io::Result<SummaryRow> {
        let records = self.record_log(provider).read_records()?;

        let mut latest: HashMap<u32, bool> = HashMap::new();
        for record in records {
            latest.insert(record.index, record.is_correct);
        }

        let total_count = latest.len();
        let correct_count = latest.values().filter(|correct| **correct).count();

        Ok(SummaryRow {
            provider: provider.to_string(),
            accuracy: accuracy(correct_count, total_count),
            correct_count,
            total_count,
        })
    }

    /// Provider names discovered from record logs in the run directory
    pub fn providers_on_disk(&self) -> std::io::Result<Vec<String>> {
        let mut providers = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(provider) = name.strip_suffix("_results.csv") {
                providers.push(provider.to_string());
            }
        }
        providers.sort();
        Ok(providers)
    }
}

/// Accuracy as correct over total, rounded to three decimal places
pub fn accuracy(correct_count: usize, total_count: usize) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    (correct_count as f64 / total_count as f64 * 1000.0).round() / 1000.0
}

/// Resolve the run directory. Fresh runs get a timestamped subdirectory;
/// resumed runs reuse the given directory as-is.
pub fn run_directory(output_dir: &Path, resume: bool) -> PathBuf {
    if resume {
        output_dir.to_path_buf()
    } else {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        output_dir.join(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example(index: u32, question: &str, answer: &str) -> Example {
        Example {
            index,
            question: question.to_string(),
            reference_answer: answer.to_string(),
        }
    }

    fn correct_record(index: u32) -> EvaluationRecord {
        EvaluationRecord::graded(
            &example(index, &format!("q{}", index), "ref"),
            "ref".to_string(),
            true,
            "CORRECT".to_string(),
        )
    }

    #[tokio::test]
    async fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("tavily");

        log.append(&correct_record(0)).await.unwrap();
        log.append(&correct_record(1)).await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "index,question,reference_answer,predicted_answer,is_correct,grade,error"
        );
        assert!(lines[1].starts_with("0,"));
        assert!(lines[2].starts_with("1,"));
    }

    #[tokio::test]
    async fn test_record_round_trip_with_special_characters() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("tavily");

        let record = EvaluationRecord::graded(
            &example(3, "Who said \"veni, vidi, vici\"?", "Julius Caesar"),
            "Julius Caesar,\naccording to Suetonius".to_string(),
            true,
            "CORRECT".to_string(),
        );
        log.append(&record).await.unwrap();

        let records = log.read_records().unwrap();
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn test_failed_record_shape() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("exa");

        let record = EvaluationRecord::failed(
            &example(5, "q5", "a5"),
            "API error: 500 - upstream down".to_string(),
        );
        log.append(&record).await.unwrap();

        let records = log.read_records().unwrap();
        assert_eq!(records[0].predicted_answer, "ERROR");
        assert_eq!(records[0].grade, ERROR_GRADE);
        assert!(!records[0].is_correct);
        assert_eq!(
            records[0].error.as_deref(),
            Some("API error: 500 - upstream down")
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_well_formed() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("tavily");

        let mut handles = Vec::new();
        for i in 0..16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(&correct_record(i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 16);
        let indices: HashSet<u32> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices.len(), 16);
    }

    #[tokio::test]
    async fn test_pending_examples_resume_rules() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let examples = vec![
            example(0, "q0", "a0"),
            example(1, "q1", "a1"),
            example(2, "q2", "a2"),
        ];

        // Missing log schedules everything even with resume on
        let pending = store
            .pending_examples("tavily", &examples, true, false)
            .unwrap();
        assert_eq!(pending.len(), 3);

        let log = store.record_log("tavily");
        log.append(&correct_record(0)).await.unwrap();
        log.append(&EvaluationRecord::failed(&examples[1], "boom".to_string()))
            .await
            .unwrap();

        // Fresh run ignores the log
        let pending = store
            .pending_examples("tavily", &examples, false, false)
            .unwrap();
        assert_eq!(pending.len(), 3);

        // Resume skips the completed index, keeps the failed and unseen ones
        let pending = store
            .pending_examples("tavily", &examples, true, false)
            .unwrap();
        let indices: Vec<u32> = pending.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);

        // Random sampling disables resume filtering
        let pending = store
            .pending_examples("tavily", &examples, true, true)
            .unwrap();
        assert_eq!(pending.len(), 3);

        // Once every index has a non-error grade, resume schedules nothing
        log.append(&correct_record(1)).await.unwrap();
        log.append(&correct_record(2)).await.unwrap();
        let pending = store
            .pending_examples("tavily", &examples, true, false)
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_write_summary_counts_and_rounding() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("tavily");

        log.append(&correct_record(0)).await.unwrap();
        log.append(&correct_record(1)).await.unwrap();
        log.append(&EvaluationRecord::graded(
            &example(2, "q2", "a2"),
            "wrong".to_string(),
            false,
            "INCORRECT".to_string(),
        ))
        .await
        .unwrap();

        let brave_log = store.record_log("brave");
        brave_log
            .append(&EvaluationRecord::graded(
                &example(0, "q0", "a0"),
                "wrong".to_string(),
                false,
                "INCORRECT".to_string(),
            ))
            .await
            .unwrap();

        let rows = store
            .write_summary(&["tavily".to_string(), "brave".to_string()])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].correct_count, 2);
        assert_eq!(rows[0].total_count, 3);
        assert_eq!(rows[0].accuracy, 0.667);

        let content = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "provider,accuracy,correct_count,total_count,timestamp"
        );
        assert!(lines.next().unwrap().starts_with("tavily,0.667,2,3,"));
        // Whole accuracies are written with a decimal point
        assert!(lines.next().unwrap().starts_with("brave,0.0,0,1,"));
    }

    #[tokio::test]
    async fn test_summary_deduplicates_retried_indices() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        let log = store.record_log("exa");

        // First run failed on index 1, resume retried it successfully
        log.append(&correct_record(0)).await.unwrap();
        log.append(&EvaluationRecord::failed(
            &example(1, "q1", "a1"),
            "boom".to_string(),
        ))
        .await
        .unwrap();
        log.append(&correct_record(1)).await.unwrap();

        let rows = store.write_summary(&["exa".to_string()]).unwrap();
        assert_eq!(rows[0].total_count, 2);
        assert_eq!(rows[0].correct_count, 2);
        assert_eq!(rows[0].accuracy, 1.0);

        let content = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(content.lines().nth(1).unwrap().starts_with("exa,1.0,2,2,"));
    }

    #[tokio::test]
    async fn test_providers_on_disk() {
        let dir = tempdir().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();

        store.record_log("tavily").append(&correct_record(0)).await.unwrap();
        store.record_log("brave").append(&correct_record(0)).await.unwrap();
        std::fs::write(dir.path().join("summary.csv"), "provider\n").unwrap();

        let providers = store.providers_on_disk().unwrap();
        assert_eq!(providers, vec!["brave", "tavily"]);
    }

    #[test]
    fn test_accuracy_rounding() {
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(1, 3), 0.333);
        assert_eq!(accuracy(2, 3), 0.667);
        assert_eq!(accuracy(3, 3), 1.0);
    }

    #[test]
    fn test_run_directory_resume_reuses_dir() {
        let base = Path::new("results");
        assert_eq!(run_directory(base, true), PathBuf::from("results"));

        let fresh = run_directory(base, false);
        assert_ne!(fresh, PathBuf::from("results"));
        assert!(fresh.starts_with("results"));
    }
}
