use polyjudge_common::types::Language;
use thiserror::Error;

/// Stage-level failures that end a task run early.
///
/// Comparison problems never show up here; they only flip the verdict.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Dependency Installation Failed: {0}")]
    DependencyInstall(String),
    #[error("Build failed: {0}")]
    Build(String),
    #[error("Unsupported language for {stage}: {language}")]
    UnsupportedLanguage { stage: &'static str, language: Language },
    #[error("Execution failed: {0}")]
    Execution(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
