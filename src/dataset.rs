//! Dataset loading for question/answer evaluation sets

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::csvio;

/// One question/answer pair from the dataset.
///
/// `index` is the zero-based position in the full dataset file and stays
/// stable across slicing and sampling, so record logs from different runs
/// refer to the same examples.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub index: u32,
    pub question: String,
    pub reference_answer: String,
}

/// Error types for dataset loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Load examples from a CSV dataset with `problem` and `answer` columns.
///
/// When `random_sample` is set, that many examples are drawn from the whole
/// dataset and the slice bounds are ignored. Otherwise `[start_index,
/// end_index)` selects a slice, clamped so at least one example survives.
pub fn load_dataset(
    path: &Path,
    start_index: usize,
    end_index: Option<usize>,
    random_sample: Option<usize>,
) -> Result<Vec<Example>, LoadError> {
    tracing::info!("Loading dataset from {}", path.display());
    let content = fs::read_to_string(path)?;

    let mut rows = csvio::parse_rows(&content);
    if rows.is_empty() {
        return Err(LoadError::Parse("dataset file is empty".to_string()));
    }

    let header = rows.remove(0);
    let question_col = column_index(&header, "problem")?;
    let answer_col = column_index(&header, "answer")?;

    let mut examples = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        examples.push(Example {
            index: position as u32,
            question: row.get(question_col).cloned().unwrap_or_default(),
            reference_answer: row.get(answer_col).cloned().unwrap_or_default(),
        });
    }

    if examples.is_empty() {
        return Err(LoadError::Parse("dataset contains no examples".to_string()));
    }

    Ok(select_examples(examples, start_index, end_index, random_sample))
}

fn column_index(header: &[String], name: &str) -> Result<usize, LoadError> {
    header
        .iter()
        .position(|col| col == name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

fn select_examples(
    mut examples: Vec<Example>,
    start_index: usize,
    end_index: Option<usize>,
    random_sample: Option<usize>,
) -> Vec<Example> {
    let total = examples.len();

    if let Some(n) = random_sample.filter(|n| *n > 0) {
        let sample_size = n.min(total);
        tracing::info!("Randomly sampling {} of {} examples", sample_size, total);
        examples.shuffle(&mut rand::thread_rng());
        examples.truncate(sample_size);
        return examples;
    }

    let start = start_index.min(total - 1);
    let end = end_index.unwrap_or(total).min(total).max(start + 1);
    tracing::info!(
        "Using examples {}..{} of {} total",
        start,
        end,
        total
    );

    let mut selected = examples.split_off(start);
    selected.truncate(end - start);
    selected
}
