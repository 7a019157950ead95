// Run report: per-task verdicts plus pass rate
use chrono::{DateTime, Utc};
use polyjudge_common::types::TaskResult;
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub task_id: String,
    #[serde(flatten)]
    pub result: TaskResult,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub model: String,
    pub entries: Vec<ReportEntry>,
    pub total_elapsed_ms: u64,
}

impl Report {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            model: model.into(),
            entries: Vec::new(),
            total_elapsed_ms: 0,
        }
    }

    pub fn record(&mut self, task_id: impl Into<String>, result: TaskResult, elapsed_ms: u64) {
        self.entries.push(ReportEntry {
            task_id: task_id.into(),
            result,
            elapsed_ms,
        });
    }

    pub fn passed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.result.passed).count()
    }

    /// Percentage of passed tasks; 0 for an empty run
    pub fn pass_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.passed_count() as f64 / self.entries.len() as f64 * 100.0
    }

    pub fn render_human(&self) -> String {
        let mut out = String::from("--- Benchmark Results ---\n");
        for entry in &self.entries {
            let status = if entry.result.passed { "PASSED" } else { "FAILED" };
            let _ = write!(out, "- {}: {}", entry.task_id, status);
            if let Some(error) = &entry.result.error {
                let _ = write!(out, " Error: {}", error);
            }
            out.push('\n');
            if !entry.result.warnings.is_empty() {
                out.push_str("  Warnings:\n");
                for warning in &entry.result.warnings {
                    let _ = writeln!(out, "    - {}", warning);
                }
            }
        }
        let _ = writeln!(
            out,
            "\nPass Rate: {:.2}% ({}/{})",
            self.pass_rate(),
            self.passed_count(),
            self.entries.len()
        );
        out
    }

    /// Single `passed:elapsed_ms` line for scripted comparisons
    pub fn render_benchmark(&self) -> String {
        format!("{}:{}", self.passed_count(), self.total_elapsed_ms)
    }
}
