//! Result persistence and console reporting

pub mod store;

pub use store::{
    accuracy, run_directory, EvaluationRecord, RecordLog, ResultStore, SummaryRow, ERROR_GRADE,
};

use crate::runner::ProviderReport;

/// Print the end-of-run results block for this run's evaluations
pub fn print_results(dataset: &str, reports: &[ProviderReport]) {
    println!("\n===== EVALUATION RESULTS =====");
    println!("Dataset: {}", dataset);
    println!("-----------------------------");
    for report in reports {
        println!(
            "{}: {:.2}% ({}/{})",
            report.provider,
            report.accuracy * 100.0,
            report.correct_count,
            report.total_count
        );
    }
    println!("=============================\n");
}

/// Print the recomputed summary for an existing run directory
pub fn print_summary(run_dir: &str, rows: &[SummaryRow]) {
    println!("\n===== EVALUATION RESULTS =====");
    println!("Run: {}", run_dir);
    println!("-----------------------------");
    for row in rows {
        println!(
            "{}: {:.2}% ({}/{})",
            row.provider,
            row.accuracy * 100.0,
            row.correct_count,
            row.total_count
        );
    }
    println!("=============================\n");
}
