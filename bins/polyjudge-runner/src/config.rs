// Run configuration for the pipeline
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_TOOLCHAINS_PATH: &str = "config/toolchains.json";

/// Program names for every external tool the pipeline invokes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Python environment and package manager
    pub uv: String,
    /// TypeScript runtime and package manager
    pub bun: String,
    pub clang: String,
    pub cargo: String,
    pub zig: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            uv: "uv".to_string(),
            bun: "bun".to_string(),
            clang: "clang".to_string(),
            cargo: "cargo".to_string(),
            zig: "zig".to_string(),
        }
    }
}

impl ToolchainConfig {
    /// Load overrides from a JSON file; unspecified tools keep their defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Toolchain config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Load `config/toolchains.json` if present, defaults otherwise
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new(DEFAULT_TOOLCHAINS_PATH);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Everything a run needs, passed explicitly to the runner and orchestrator
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    /// Quiet mode: only the `passed:elapsed_ms` summary is printed
    pub benchmark: bool,
    pub tasks_dir: PathBuf,
    /// Per test-case wall-clock limit; `None` waits indefinitely
    pub execution_timeout: Option<Duration>,
    pub toolchains: ToolchainConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            benchmark: false,
            tasks_dir: PathBuf::from("./tasks"),
            execution_timeout: None,
            toolchains: ToolchainConfig::default(),
        }
    }
}
