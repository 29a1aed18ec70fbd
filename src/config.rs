//! Run configuration loaded from `batchrun.toml`.
//!
//! The [`BatchConfig`] struct holds every tunable of a run. Keys missing
//! from the file fall back to defaults, and a missing file means all
//! defaults. Relative paths are resolved against the base directory, which
//! is the directory of the running executable unless overridden.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SetupError;
use crate::runner::{CommandTemplate, INPUT_PLACEHOLDER};
use crate::state_machine::RetryConfig;

/// File looked up in the base directory when no `--config` is given.
pub const CONFIG_FILE: &str = "batchrun.toml";

/// Environment variable overriding the base directory.
pub const BASE_DIR_ENV: &str = "BATCHRUN_BASE_DIR";

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Directory holding the input files, relative to the base directory.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Only files whose name ends with this suffix are processed.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// External program run once per attempt.
    #[serde(default = "default_program")]
    pub program: String,

    /// Program arguments; `{input}` is replaced by the item path.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Retries after the first failed attempt of an item.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Exit non-zero when any item failed.
    #[serde(default)]
    pub strict_exit: bool,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("inputs")
}

fn default_suffix() -> String {
    ".txt".to_string()
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "main.py".to_string(),
        "--input".to_string(),
        INPUT_PLACEHOLDER.to_string(),
    ]
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            suffix: default_suffix(),
            program: default_program(),
            args: default_args(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            strict_exit: false,
        }
    }
}

impl BatchConfig {
    /// Load `explicit` when given (it must exist), otherwise `batchrun.toml`
    /// in `base_dir` if present, otherwise defaults.
    pub fn load(base_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = base_dir.join(CONFIG_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: BatchConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the run cannot honour. Called after every override.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.program.trim().is_empty() {
            return Err(SetupError::Config("`program` must not be empty".into()));
        }
        // An item gets `max_retries + 1` attempts, which must fit in a u32.
        if self.max_retries == u32::MAX {
            return Err(SetupError::Config(format!(
                "`max_retries` must be below {}",
                u32::MAX
            )));
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn command(&self) -> CommandTemplate {
        CommandTemplate::new(self.program.clone(), self.args.clone())
    }

    /// Input directory with a relative path anchored at `base_dir`.
    pub fn input_dir_in(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.input_dir)
    }
}

/// Base directory for relative paths: the `--base-dir` flag, then
/// `BATCHRUN_BASE_DIR`, then the directory of the running executable.
pub fn resolve_base_dir(flag: Option<&Path>) -> Result<PathBuf> {
    match base_dir_override(flag, env::var_os(BASE_DIR_ENV)) {
        Some(dir) => Ok(dir),
        None => executable_dir(),
    }
}

fn base_dir_override(flag: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("locating the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    match exe.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Err(SetupError::Config(format!(
            "executable path {} has no parent directory",
            exe.display()
        ))
        .into()),
    }
}
