/// Task Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Drive one task from raw completion payload to `TaskResult`.
///
/// **Stages:**
/// 1. Parse the payload (`response`)
/// 2. Write the source and install dependencies (`Toolchain::install`)
/// 3. Build compiled languages (`Toolchain::build`)
/// 4. Run every test case in order (`Toolchain::execute`), collecting
///    warnings from stderr and judging output (`evaluator`)
/// 5. Remove the working directory, whatever happened above
///
/// A stage error (install, build, failure to launch the program) ends the run
/// with `passed = false` and the error message. Comparison failures do not
/// stop the run; remaining test cases still execute so warnings are complete.

use crate::engine::Toolchain;
use crate::error::PipelineError;
use crate::evaluator::{self, TestStatus};
use crate::response;
use crate::warnings;
use polyjudge_common::types::{CandidateSolution, Task, TaskResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Working directory cleanup guard - removes the directory on drop.
/// Covers early returns, errors and panics alike.
struct WorkDirGuard {
    path: PathBuf,
}

impl WorkDirGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for WorkDirGuard {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed working directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Error during cleanup"),
        }
    }
}

pub struct TaskExecutor<T: Toolchain> {
    toolchain: T,
}

impl<T: Toolchain> TaskExecutor<T> {
    pub fn new(toolchain: T) -> Self {
        Self { toolchain }
    }

    #[cfg(test)]
    pub(crate) fn toolchain_ref(&self) -> &T {
        &self.toolchain
    }

    /// Parse a raw completion payload and run it against the task
    pub async fn run_task(&self, task: &Task, raw_payload: &str) -> TaskResult {
        let candidate = response::parse(raw_payload);
        self.run_candidate(task, &candidate).await
    }

    #[instrument(
        skip(self, task, candidate),
        fields(task_id = %task.id, language = %task.language, test_count = task.tests.len())
    )]
    pub async fn run_candidate(&self, task: &Task, candidate: &CandidateSolution) -> TaskResult {
        let _guard = WorkDirGuard::new(&task.working_directory);
        let mut all_warnings = Vec::new();

        match self.run_stages(task, candidate, &mut all_warnings).await {
            Ok(passed) => {
                info!(passed, warnings = all_warnings.len(), "Task finished");
                TaskResult {
                    passed,
                    error: None,
                    warnings: all_warnings,
                }
            }
            Err(e) => {
                warn!(error = %e, "Task aborted");
                TaskResult::failed(e.to_string(), all_warnings)
            }
        }
    }

    async fn run_stages(
        &self,
        task: &Task,
        candidate: &CandidateSolution,
        all_warnings: &mut Vec<String>,
    ) -> Result<bool, PipelineError> {
        let solution_file = task.solution_file();
        let source_path = task.working_directory.join(&solution_file);
        if let Some(parent) = source_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&source_path, &candidate.code).await?;

        self.toolchain.install(task, candidate).await?;

        if task.language.is_compiled() {
            let build = self.toolchain.build(task, &solution_file, candidate).await;
            if let Some(error) = build.error {
                return Err(PipelineError::Build(error));
            }
            all_warnings.extend(build.warnings);
        }

        let mut statuses = Vec::with_capacity(task.tests.len());
        for (idx, test_case) in task.tests.iter().enumerate() {
            let outcome = self
                .toolchain
                .execute(task, &solution_file, &test_case.input)
                .await?;

            if !outcome.stderr.is_empty() {
                all_warnings.extend(warnings::extract(task.language, &outcome.stderr));
            }

            let status = evaluator::evaluate_test(&outcome, test_case);
            match status {
                TestStatus::Passed => debug!(test_num = idx + 1, "Output matched"),
                TestStatus::Failed => debug!(
                    test_num = idx + 1,
                    expected = test_case.expected_output.trim(),
                    actual = outcome.stdout.trim(),
                    "Output mismatch"
                ),
                TestStatus::RuntimeError => warn!(
                    test_num = idx + 1,
                    exit_code = outcome.exit_code,
                    stderr = outcome.stderr.lines().next().unwrap_or(""),
                    "Runtime error"
                ),
                TestStatus::TimeLimitExceeded => warn!(
                    test_num = idx + 1,
                    execution_ms = outcome.execution_time_ms,
                    "Timed out"
                ),
            }
            statuses.push(status);
        }

        Ok(evaluator::all_passed(&statuses))
    }
}
