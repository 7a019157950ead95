mod config;
mod engine;
mod error;
mod evaluator;
mod executor;
mod installer;
mod provider;
mod report;
mod response;
mod warnings;


use anyhow::Result;
use clap::Parser;
use config::{RunConfig, ToolchainConfig, DEFAULT_MODEL};
use engine::LocalToolchain;
use executor::TaskExecutor;
use polyjudge_common::tasks::load_tasks;
use polyjudge_common::types::TaskResult;
use provider::{CompletionProvider, DirectoryProvider, OpenRouterProvider, DEFAULT_API_BASE};
use report::Report;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

#[derive(Parser)]
#[command(name = "polyjudge")]
#[command(about = "Run generated solutions against benchmark tasks and report the pass rate", long_about = None)]
struct Cli {
    /// Model requested from the completion provider
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Print only `passed:elapsed_ms`
    #[arg(short, long, default_value = "false")]
    benchmark: bool,

    /// Directory holding one sub-directory per task
    #[arg(short, long, default_value = "./tasks")]
    tasks_dir: PathBuf,

    /// Toolchain overrides (defaults to config/toolchains.json when present)
    #[arg(long)]
    toolchains: Option<PathBuf>,

    /// Wall-clock limit per test-case run, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Replay payloads from `<dir>/<task-id>.txt` instead of querying a model
    #[arg(short, long)]
    responses_dir: Option<PathBuf>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Print the report as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.benchmark { "warn" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    }

    let toolchains = match &cli.toolchains {
        Some(path) => ToolchainConfig::load(path)?,
        None => ToolchainConfig::load_default()?,
    };

    let config = RunConfig {
        model: cli.model.clone(),
        benchmark: cli.benchmark,
        tasks_dir: cli.tasks_dir.clone(),
        execution_timeout: cli.timeout_ms.map(Duration::from_millis),
        toolchains,
    };

    let provider: Box<dyn CompletionProvider> = match &cli.responses_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Replaying saved responses");
            Box::new(DirectoryProvider::new(dir))
        }
        None => Box::new(OpenRouterProvider::from_env(config.model.clone())?.with_api_base(cli.api_base.clone())),
    };

    let report = run(&config, provider.as_ref()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if config.benchmark {
        println!("{}", report.render_benchmark());
    } else {
        print!("{}", report.render_human());
    }

    Ok(())
}

/// Process every task in id order; one task's failure never stops the run
#[instrument(skip_all, fields(model = %config.model))]
async fn run(config: &RunConfig, provider: &dyn CompletionProvider) -> Result<Report> {
    let run_start = Instant::now();
    let tasks = load_tasks(&config.tasks_dir)?;
    info!(count = tasks.len(), tasks_dir = %config.tasks_dir.display(), "Loaded tasks");

    let executor = TaskExecutor::new(LocalToolchain::new(
        config.toolchains.clone(),
        config.execution_timeout,
    ));
    let mut report = Report::new(&config.model);

    for task in &tasks {
        let task_start = Instant::now();
        info!(task_id = %task.id, language = %task.language, "Running task");

        let result = match provider.complete(task).await {
            Ok(Some(payload)) => executor.run_task(task, &payload).await,
            Ok(None) => {
                warn!(task_id = %task.id, "Model failed to generate code");
                TaskResult::failed("LLM failure", Vec::new())
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Completion provider error");
                TaskResult::failed(format!("{:#}", e), Vec::new())
            }
        };

        let elapsed_ms = task_start.elapsed().as_millis() as u64;
        info!(
            task_id = %task.id,
            passed = result.passed,
            elapsed_ms,
            "Task completed"
        );
        report.record(task.id.clone(), result, elapsed_ms);
    }

    report.total_elapsed_ms = run_start.elapsed().as_millis() as u64;
    Ok(report)
}
