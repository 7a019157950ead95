/// Execution Engine - Toolchain Adapters
///
/// **Core Responsibility:**
/// Install, build and run candidate code with the local toolchains and
/// capture raw outputs.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to build and run each language
/// - Engine does NOT compare outputs or decide verdicts
/// - Engine returns raw outcomes for the evaluator to judge
///
/// The orchestrator talks to the engine through the `Toolchain` trait so the
/// verdict logic can be exercised without real compilers installed.

use crate::config::ToolchainConfig;
use crate::error::PipelineError;
use crate::installer;
use crate::warnings;
use async_trait::async_trait;
use polyjudge_common::types::{BuildOutcome, CandidateSolution, ExecutionOutcome, Language, Task};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Fixed diagnostics appended to every C build
const C_DIAGNOSTIC_FLAGS: [&str; 2] = ["-Wall", "-Wextra"];

/// Captured result of one external process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub execution_time_ms: u64,
    pub timed_out: bool,
}

impl From<ProcessOutput> for ExecutionOutcome {
    fn from(output: ProcessOutput) -> Self {
        ExecutionOutcome {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            execution_time_ms: output.execution_time_ms,
            timed_out: output.timed_out,
        }
    }
}

/// Run a command to completion, optionally feeding `stdin` and enforcing a
/// wall-clock limit. The child is killed if the limit expires.
pub async fn run_process(
    mut command: Command,
    stdin: Option<&str>,
    timeout: Option<Duration>,
) -> std::io::Result<ProcessOutput> {
    command
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start_time = Instant::now();
    let mut child = command.spawn()?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.as_bytes().to_vec();
        // Written concurrently so a child that fills its stdout pipe before
        // reading all input cannot deadlock us. Dropping the pipe sends EOF.
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(&input).await {
                debug!(error = %e, "Child closed stdin before reading all input");
            }
        });
    }

    let wait = child.wait_with_output();
    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(output) => output?,
            Err(_) => {
                return Ok(ProcessOutput {
                    stderr: "[Execution timed out]".to_string(),
                    exit_code: -1,
                    execution_time_ms: start_time.elapsed().as_millis() as u64,
                    timed_out: true,
                    ..Default::default()
                });
            }
        },
        None => wait.await?,
    };

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
        execution_time_ms: start_time.elapsed().as_millis() as u64,
        timed_out: false,
    })
}

/// Where the builder leaves a runnable artifact and where the executor looks
/// for it. Both sides go through here, so the two can't drift apart.
pub struct BinaryLocator;

impl BinaryLocator {
    /// Artifact path relative to the task's working directory; `None` for
    /// interpreted languages
    pub fn locate(task: &Task) -> Option<PathBuf> {
        match task.language {
            Language::C | Language::Zig => {
                let solution = task.solution_file();
                solution.file_stem().map(PathBuf::from)
            }
            Language::Rust => Some(
                PathBuf::from("target")
                    .join("release")
                    .join(task.package_name()),
            ),
            Language::Python | Language::TypeScript => None,
        }
    }
}

/// Per-language capabilities the orchestrator sequences
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Materialize the task's environment and install declared dependencies
    async fn install(&self, task: &Task, candidate: &CandidateSolution) -> Result<(), PipelineError>;

    /// Compile the candidate. Never fails: problems land in `BuildOutcome::error`
    async fn build(&self, task: &Task, solution_file: &Path, candidate: &CandidateSolution) -> BuildOutcome;

    /// Run the candidate once with `input` on stdin
    async fn execute(
        &self,
        task: &Task,
        solution_file: &Path,
        input: &str,
    ) -> Result<ExecutionOutcome, PipelineError>;
}

/// Toolchains installed on the host, invoked as child processes
#[derive(Debug, Clone)]
pub struct LocalToolchain {
    config: ToolchainConfig,
    execution_timeout: Option<Duration>,
}

impl LocalToolchain {
    pub fn new(config: ToolchainConfig, execution_timeout: Option<Duration>) -> Self {
        Self {
            config,
            execution_timeout,
        }
    }

    /// The one build invocation per compiled language
    fn build_command(
        &self,
        task: &Task,
        solution_file: &Path,
        candidate: &CandidateSolution,
    ) -> Option<Command> {
        let artifact = BinaryLocator::locate(task)?;
        let mut command = match task.language {
            Language::C => {
                let mut cmd = Command::new(&self.config.clang);
                cmd.arg(solution_file)
                    .arg("-o")
                    .arg(&artifact)
                    .args(&candidate.compile_flags)
                    .args(C_DIAGNOSTIC_FLAGS);
                cmd
            }
            Language::Rust => {
                let mut cmd = Command::new(&self.config.cargo);
                // A redirected target dir would move the binary away from the locator path
                cmd.args(["build", "--release"]).env_remove("CARGO_TARGET_DIR");
                cmd
            }
            Language::Zig => {
                let mut cmd = Command::new(&self.config.zig);
                cmd.arg("build-exe")
                    .arg(solution_file)
                    .args(["-O", "ReleaseFast"])
                    .arg(format!("-femit-bin={}", artifact.display()));
                cmd
            }
            Language::Python | Language::TypeScript => return None,
        };
        command.current_dir(&task.working_directory);
        Some(command)
    }

    /// The one run invocation per language
    fn run_command(&self, task: &Task, dir: &Path, solution_file: &Path) -> Result<Command, PipelineError> {
        let mut command = match task.language {
            Language::Python => {
                let mut cmd = Command::new(dir.join(installer::VENV_DIR).join("bin").join("python"));
                cmd.arg(solution_file);
                cmd
            }
            Language::TypeScript => {
                let mut cmd = Command::new(&self.config.bun);
                cmd.arg("run").arg(solution_file);
                cmd
            }
            Language::C | Language::Rust | Language::Zig => {
                let artifact = BinaryLocator::locate(task).ok_or(PipelineError::UnsupportedLanguage {
                    stage: "execution",
                    language: task.language,
                })?;
                Command::new(dir.join(artifact))
            }
        };
        command.current_dir(dir);
        Ok(command)
    }
}

#[async_trait]
impl Toolchain for LocalToolchain {
    async fn install(&self, task: &Task, candidate: &CandidateSolution) -> Result<(), PipelineError> {
        installer::install(&self.config, task, candidate).await
    }

    #[tracing::instrument(skip(self, task, candidate), fields(task_id = %task.id, language = %task.language))]
    async fn build(&self, task: &Task, solution_file: &Path, candidate: &CandidateSolution) -> BuildOutcome {
        let Some(command) = self.build_command(task, solution_file, candidate) else {
            return BuildOutcome::failure(format!(
                "Unsupported language for compilation: {}",
                task.language
            ));
        };

        let output = match run_process(command, None, None).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Failed to invoke compiler");
                return BuildOutcome::failure(e.to_string());
            }
        };

        if output.exit_code != 0 {
            warn!(
                exit_code = output.exit_code,
                error_preview = output.stderr.lines().next().unwrap_or(""),
                "Compilation failed"
            );
            return BuildOutcome::failure(output.stderr);
        }

        let warnings = warnings::extract(task.language, &output.stderr);
        info!(
            compilation_time_ms = output.execution_time_ms,
            warnings = warnings.len(),
            "Compilation succeeded"
        );
        BuildOutcome::success(warnings)
    }

    async fn execute(
        &self,
        task: &Task,
        solution_file: &Path,
        input: &str,
    ) -> Result<ExecutionOutcome, PipelineError> {
        // Program paths must be absolute: relative ones are not resolved
        // against `current_dir` portably.
        let dir = tokio::fs::canonicalize(&task.working_directory).await?;
        let command = self.run_command(task, &dir, solution_file)?;
        let program = command.as_std().get_program().to_string_lossy().into_owned();

        let output = run_process(command, Some(input), self.execution_timeout)
            .await
            .map_err(|e| PipelineError::Execution(format!("{}: {}", program, e)))?;

        if output.timed_out {
            warn!(
                task_id = %task.id,
                execution_ms = output.execution_time_ms,
                "Test execution timed out"
            );
        } else {
            debug!(
                task_id = %task.id,
                exit_code = output.exit_code,
                execution_ms = output.execution_time_ms,
                "Test execution finished"
            );
        }

        Ok(output.into())
    }
}
