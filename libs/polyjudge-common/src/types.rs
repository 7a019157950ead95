use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Target languages a task can be written in.
///
/// The set is closed: every pipeline stage matches on it exhaustively, so a
/// new language has to be handled by the installer, builder, executor and
/// warning extractor before the crate compiles again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    C,
    Rust,
    Zig,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::TypeScript,
        Language::C,
        Language::Rust,
        Language::Zig,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "python" => Some(Language::Python),
            "typescript" => Some(Language::TypeScript),
            "c" => Some(Language::C),
            "rust" => Some(Language::Rust),
            "zig" => Some(Language::Zig),
            _ => None,
        }
    }

    /// File extension used for the candidate's source file
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::TypeScript => "ts",
            Language::C => "c",
            Language::Rust => "rs",
            Language::Zig => "zig",
        }
    }

    /// Whether a build step runs before the test cases
    pub fn is_compiled(&self) -> bool {
        matches!(self, Language::C | Language::Rust | Language::Zig)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::C => "c",
            Language::Rust => "rust",
            Language::Zig => "zig",
        };
        write!(f, "{}", name)
    }
}

/// How a test case's expected output is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFormat {
    /// Both sides parsed as JSON and compared structurally
    Structured,
    /// Both sides trimmed and compared as text
    Plain,
}

impl TestFormat {
    /// Map a fixture file extension (`json` / `txt`) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(TestFormat::Structured),
            "txt" => Some(TestFormat::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    pub format: TestFormat,
}

/// One benchmark item, as produced by the task repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub language: Language,
    pub extension: String,
    pub tests: Vec<TestCase>,
    pub prompt: String,
    /// Exclusively owned by this task's run; removed when the run ends
    pub working_directory: PathBuf,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        language: Language,
        tests: Vec<TestCase>,
        prompt: impl Into<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            language,
            extension: language.extension().to_string(),
            tests,
            prompt: prompt.into(),
            working_directory: working_directory.into(),
        }
    }

    /// Path of the candidate's source, relative to the working directory
    pub fn solution_file(&self) -> PathBuf {
        match self.language {
            Language::Rust => PathBuf::from("src").join(format!("main.{}", self.extension)),
            _ => PathBuf::from(format!("solution.{}", self.extension)),
        }
    }

    /// Package name derived from the id with everything outside
    /// `[A-Za-z0-9_]` stripped
    pub fn package_name(&self) -> String {
        self.id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect()
    }
}

/// A generated answer split into its sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSolution {
    pub code: String,
    pub dependencies: Vec<String>,
    pub compile_flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub warnings: Vec<String>,
    /// Set when the build failed; execution must not proceed
    pub error: Option<String>,
}

impl BuildOutcome {
    pub fn success(warnings: Vec<String>) -> Self {
        Self { warnings, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Raw result of running the candidate against one test input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub execution_time_ms: u64,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl TaskResult {
    pub fn failed(error: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            passed: false,
            error: Some(error.into()),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_round_trip_names() {
        for language in Language::ALL {
            assert_eq!(Language::from_str(&language.to_string()), Some(language));
        }
        assert_eq!(Language::from_str("Python"), Some(Language::Python));
        assert_eq!(Language::from_str("cobol"), None);
    }

    #[test]
    fn test_compiled_languages() {
        assert!(Language::C.is_compiled());
        assert!(Language::Rust.is_compiled());
        assert!(Language::Zig.is_compiled());
        assert!(!Language::Python.is_compiled());
        assert!(!Language::TypeScript.is_compiled());
    }

    #[test]
    fn test_solution_file_layout() {
        let rust = Task::new("task2_rust_sort", Language::Rust, vec![], "", "/tmp/out");
        assert_eq!(rust.solution_file(), PathBuf::from("src/main.rs"));

        let zig = Task::new("task3_zig_sum", Language::Zig, vec![], "", "/tmp/out");
        assert_eq!(zig.solution_file(), PathBuf::from("solution.zig"));
    }

    #[test]
    fn test_package_name_sanitized() {
        let task = Task::new("task-4.rust json", Language::Rust, vec![], "", "/tmp/out");
        assert_eq!(task.package_name(), "task4rustjson");
    }

    #[test]
    fn test_task_result_serialization_skips_missing_error() {
        let result = TaskResult {
            passed: true,
            error: None,
            warnings: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"passed":true,"warnings":[]}"#);
    }
}
