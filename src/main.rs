//! QA Benchmark CLI

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qa_benchmark::{
    config::Config,
    dataset::load_dataset,
    judge::{JudgeClient, LlmExtractor, LlmGrader},
    providers::create_providers,
    reporting::{print_results, print_summary, run_directory, ResultStore},
    runner::{EvaluationJob, Executor, ExecutorConfig},
};

#[derive(Parser)]
#[command(name = "qa-benchmark")]
#[command(about = "Accuracy benchmark for web search and research providers on QA datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML, or legacy flat JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate configured providers against a dataset
    Run {
        /// Path to the CSV dataset with problem and answer columns
        #[arg(short, long, default_value = "datasets/simple_qa_test_set.csv")]
        dataset: PathBuf,

        /// Starting example index, inclusive
        #[arg(long, default_value = "0")]
        start_index: usize,

        /// Ending example index, exclusive (default: end of dataset)
        #[arg(long)]
        end_index: Option<usize>,

        /// Evaluate a random sample of this many examples instead of a slice
        #[arg(long)]
        random_sample: Option<usize>,

        /// Model used for answer extraction and grading
        #[arg(long, default_value = "gpt-4.1-mini")]
        judge_model: String,

        /// Number of parallel requests per provider
        #[arg(long, default_value = "8")]
        parallel: usize,

        /// Evaluate providers one at a time instead of concurrently
        #[arg(long)]
        sequential: bool,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Resume a previous run in the output directory, retrying only
        /// failed examples
        #[arg(long)]
        resume: bool,
    },

    /// Recompute the summary for an existing run directory
    Summarize {
        /// Path to a run directory containing record logs
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "configs/providers.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("qa_benchmark=debug,info")
    } else {
        EnvFilter::new("qa_benchmark=info,warn")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            dataset,
            start_index,
            end_index,
            random_sample,
            judge_model,
            parallel,
            sequential,
            output,
            resume,
        } => {
            run_benchmark(
                dataset,
                cli.config,
                start_index,
                end_index,
                random_sample,
                judge_model,
                parallel,
                sequential,
                output,
                resume,
            )
            .await?;
        }

        Commands::Summarize { input } => {
            summarize(input)?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

async fn run_benchmark(
    dataset: PathBuf,
    config_path: Option<PathBuf>,
    start_index: usize,
    end_index: Option<usize>,
    random_sample: Option<usize>,
    judge_model: String,
    parallel: usize,
    sequential: bool,
    output: PathBuf,
    resume: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if resume && !output.exists() {
        eprintln!(
            "Error: --resume needs an existing run directory: {}",
            output.display()
        );
        std::process::exit(1);
    }

    let run_dir = run_directory(&output, resume);

    println!("=== QA Provider Benchmark ===");
    println!("Dataset: {}", dataset.display());
    println!("Output:  {}", run_dir.display());
    println!();

    // Provider handlers from config and environment
    let config = Config::load_or_default(config_path.as_deref())?;
    let providers = create_providers(&config)?;

    if providers.is_empty() {
        eprintln!("Error: No providers available. Check the config and API keys.");
        eprintln!("  TAVILY_API_KEY for Tavily");
        eprintln!("  EXA_API_KEY for Exa");
        eprintln!("  PERPLEXITY_API_KEY for Perplexity");
        eprintln!("  BRAVE_API_KEY for Brave");
        eprintln!("  SERPER_API_KEY for Serper");
        std::process::exit(1);
    }

    let provider_names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
    println!("Providers: {}", provider_names.join(", "));

    // Load examples
    let examples = load_dataset(&dataset, start_index, end_index, random_sample)?;
    println!("Examples: {}", examples.len());
    println!();

    // Build one job per provider, filtering completed examples on resume
    let store = ResultStore::open(&run_dir)?;
    let sampled = random_sample.map_or(false, |n| n > 0);

    let mut jobs = Vec::with_capacity(providers.len());
    for provider in providers {
        let name = provider.name().to_string();
        let pending = store.pending_examples(&name, &examples, resume, sampled)?;
        let log = store.record_log(&name);
        jobs.push(EvaluationJob {
            provider,
            log,
            examples: pending,
        });
    }

    // Judge model drives extraction and grading
    let judge = JudgeClient::from_env()?.with_model(judge_model);
    let executor = Executor::new(
        Arc::new(LlmExtractor::new(judge.clone())),
        Arc::new(LlmGrader::new(judge)),
        ExecutorConfig {
            parallel_requests: parallel,
            sequential_providers: sequential,
        },
    );

    println!("Running evaluation...");
    let reports = executor.run(&jobs).await;

    // Summary is recomputed from the record logs so resumed work counts
    store.write_summary(&provider_names)?;

    print_results(&dataset.display().to_string(), &reports);
    println!("Results saved to: {}", run_dir.display());

    Ok(())
}

fn summarize(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = ResultStore::open(&input)?;
    let providers = store.providers_on_disk()?;

    if providers.is_empty() {
        eprintln!("Error: No record logs found in {}", input.display());
        std::process::exit(1);
    }

    let rows = store.write_summary(&providers)?;
    print_summary(&input.display().to_string(), &rows);
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(&output, Config::sample())?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
