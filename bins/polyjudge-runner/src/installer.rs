// Dependency installation, one policy per language
//
// python      uv venv + requirements.txt + uv pip install
// typescript  package.json + bun install (only when dependencies are declared)
// rust        Cargo.toml with the dependencies verbatim; cargo resolves at build
// c, zig      nothing to install

use crate::config::ToolchainConfig;
use crate::engine::run_process;
use crate::error::PipelineError;
use polyjudge_common::types::{CandidateSolution, Language, Task};
use serde_json::{json, Map, Value};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

pub const VENV_DIR: &str = ".venv";

pub async fn install(
    config: &ToolchainConfig,
    task: &Task,
    candidate: &CandidateSolution,
) -> Result<(), PipelineError> {
    let dir = task.working_directory.as_path();
    match task.language {
        Language::Python => install_python(config, dir, &candidate.dependencies).await,
        Language::TypeScript => {
            if candidate.dependencies.is_empty() {
                return Ok(());
            }
            install_typescript(config, dir, &candidate.dependencies).await
        }
        Language::Rust => write_cargo_manifest(task, &candidate.dependencies).await,
        Language::C | Language::Zig => Ok(()),
    }
}

/// The run step always uses the venv interpreter, so the venv is created
/// even when nothing needs installing
async fn install_python(
    config: &ToolchainConfig,
    dir: &Path,
    dependencies: &[String],
) -> Result<(), PipelineError> {
    let mut venv = Command::new(&config.uv);
    venv.args(["venv", VENV_DIR])
        .env_remove("VIRTUAL_ENV")
        .current_dir(dir);
    run_installer_step(venv).await?;

    if dependencies.is_empty() {
        return Ok(());
    }

    fs::write(dir.join("requirements.txt"), dependencies.join("\n")).await?;

    let mut pip = Command::new(&config.uv);
    pip.args(["pip", "install", "-r", "requirements.txt"])
        .env("VIRTUAL_ENV", VENV_DIR)
        .current_dir(dir);
    run_installer_step(pip).await?;

    info!(count = dependencies.len(), "Installed python dependencies");
    Ok(())
}

async fn install_typescript(
    config: &ToolchainConfig,
    dir: &Path,
    dependencies: &[String],
) -> Result<(), PipelineError> {
    let manifest = package_json(dependencies);
    let content = serde_json::to_string_pretty(&manifest)
        .map_err(|e| PipelineError::DependencyInstall(e.to_string()))?;
    fs::write(dir.join("package.json"), content).await?;

    let mut bun = Command::new(&config.bun);
    bun.arg("install").current_dir(dir);
    run_installer_step(bun).await?;

    info!(count = dependencies.len(), "Installed typescript dependencies");
    Ok(())
}

async fn write_cargo_manifest(task: &Task, dependencies: &[String]) -> Result<(), PipelineError> {
    let dir = task.working_directory.as_path();
    fs::create_dir_all(dir.join("src")).await?;
    fs::write(dir.join("Cargo.toml"), cargo_manifest(task, dependencies)).await?;
    debug!(package = %task.package_name(), "Wrote Cargo.toml");
    Ok(())
}

/// Spawn failures and nonzero exits both count as installation failures
async fn run_installer_step(command: Command) -> Result<(), PipelineError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let output = run_process(command, None, None)
        .await
        .map_err(|e| PipelineError::DependencyInstall(format!("{}: {}", program, e)))?;

    if output.exit_code != 0 {
        return Err(PipelineError::DependencyInstall(output.stderr));
    }
    Ok(())
}

/// Split `name@version`; a leading `@` belongs to a scoped package name
pub fn split_dependency(dep: &str) -> (&str, &str) {
    let separator = dep
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '@')
        .map(|(i, _)| i);

    match separator {
        Some(i) if i + 1 < dep.len() => (&dep[..i], &dep[i + 1..]),
        Some(i) => (&dep[..i], "latest"),
        None => (dep, "latest"),
    }
}

pub fn package_json(dependencies: &[String]) -> Value {
    let mut deps = Map::new();
    for dep in dependencies {
        let (name, version) = split_dependency(dep);
        deps.insert(name.to_string(), Value::String(version.to_string()));
    }
    json!({ "dependencies": deps })
}

/// The empty `[workspace]` table keeps cargo from attaching the package to an
/// enclosing workspace when the tasks directory lives inside one
pub fn cargo_manifest(task: &Task, dependencies: &[String]) -> String {
    format!(
        "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n{}\n\n[workspace]\n",
        task.package_name(),
        dependencies.join("\n"),
    )
}
