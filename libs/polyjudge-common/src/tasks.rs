// Task repository: discovers benchmark tasks from a directory tree
//
// Layout per task directory (`<tasks_dir>/<id>/`):
//   prompt.md
//   input.{json,txt} + expected_output.{json,txt}        (single case)
//   tests/<case>/input.{json,txt} + expected_output.*    (multiple cases)
// Generated code is written to `<id>/output/` while the task runs.

use crate::types::{Language, Task, TestCase, TestFormat};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Probe order for fixture files
const FIXTURE_EXTENSIONS: [&str; 2] = ["json", "txt"];

/// Load every task under `tasks_dir`, sorted by id
pub fn load_tasks(tasks_dir: &Path) -> Result<Vec<Task>> {
    let entries = fs::read_dir(tasks_dir)
        .with_context(|| format!("Failed to read tasks directory {}", tasks_dir.display()))?;

    let mut tasks = Vec::new();
    for entry in entries {
        let entry = entry?;
        let task_dir = entry.path();
        if !task_dir.is_dir() {
            continue;
        }

        let id = entry.file_name().to_string_lossy().into_owned();
        let Some(language) = language_from_id(&id) else {
            warn!(
                task_id = %id,
                supported = %supported_languages(),
                "Skipping task with unsupported language"
            );
            continue;
        };

        tasks.push(load_task(&task_dir, id, language)?);
    }

    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(count = tasks.len(), "Loaded tasks");
    Ok(tasks)
}

/// Comma-separated names of every language a task id may carry
fn supported_languages() -> String {
    Language::ALL
        .iter()
        .map(Language::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Language is the second `_`-separated segment: `task1_python_data` -> python
fn language_from_id(id: &str) -> Option<Language> {
    id.split('_').nth(1).and_then(Language::from_str)
}

fn load_task(task_dir: &Path, id: String, language: Language) -> Result<Task> {
    let tests_dir = task_dir.join("tests");
    let tests = if tests_dir.is_dir() {
        let mut case_dirs: Vec<PathBuf> = fs::read_dir(&tests_dir)
            .with_context(|| format!("Failed to read {}", tests_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        case_dirs.sort();

        case_dirs
            .iter()
            .map(|dir| load_test_case(dir))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![load_test_case(task_dir)?]
    };

    if tests.is_empty() {
        bail!("Task {} has no test cases", id);
    }

    let prompt_path = task_dir.join("prompt.md");
    let prompt = fs::read_to_string(&prompt_path)
        .with_context(|| format!("Failed to read {}", prompt_path.display()))?;

    Ok(Task::new(id, language, tests, prompt, task_dir.join("output")))
}

fn load_test_case(dir: &Path) -> Result<TestCase> {
    let (_, input) = load_fixture(&dir.join("input"))?;
    let (format, expected_output) = load_fixture(&dir.join("expected_output"))?;
    Ok(TestCase {
        input,
        expected_output,
        format,
    })
}

/// Read `<stem>.json` or `<stem>.txt`, whichever exists first
fn load_fixture(stem: &Path) -> Result<(TestFormat, String)> {
    for ext in FIXTURE_EXTENSIONS {
        let path = stem.with_extension(ext);
        if path.is_file() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let format = TestFormat::from_extension(ext)
                .with_context(|| format!("Unknown fixture extension: {}", ext))?;
            return Ok((format, content));
        }
    }
    bail!("No input or expected_output file found for {}", stem.display())
}
