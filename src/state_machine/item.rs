use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single input file handed to the external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem {
    path: PathBuf,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for log lines, falling back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Why one invocation of the external command did not succeed.
///
/// All kinds are retried the same way; the distinction only matters for
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    /// The command exited with a non-zero code.
    Exit(i32),
    /// The command ended without an exit code (killed by a signal).
    Terminated,
    /// The command could not be started (not found, not executable).
    Spawn(String),
}

impl FailureKind {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            FailureKind::Exit(code) => Some(*code),
            FailureKind::Terminated | FailureKind::Spawn(_) => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Exit(code) => write!(f, "exit code {code}"),
            FailureKind::Terminated => write!(f, "terminated without exit code"),
            FailureKind::Spawn(msg) => write!(f, "failed to launch: {msg}"),
        }
    }
}

/// The result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptResult {
    Success,
    Failure(FailureKind),
}

impl AttemptResult {
    /// Classify a process exit code. Zero is the only success.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => AttemptResult::Success,
            Some(code) => AttemptResult::Failure(FailureKind::Exit(code)),
            None => AttemptResult::Failure(FailureKind::Terminated),
        }
    }
}

/// Terminal state of a work item once all attempts are spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded {
        attempts: u32,
    },
    FailedAfterRetries {
        last_failure: FailureKind,
        attempts: u32,
    },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ItemOutcome::Succeeded { attempts } | ItemOutcome::FailedAfterRetries { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last_exit_code(&self) -> Option<i32> {
        match self {
            ItemOutcome::Succeeded { .. } => Some(0),
            ItemOutcome::FailedAfterRetries { last_failure, .. } => last_failure.exit_code(),
        }
    }
}

/// Retry bounds applied to every item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; an item gets `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Fixed pause between two attempts of the same item.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.delay, Duration::from_secs(5));
        assert_eq!(config.max_attempts(), 4);
    }

    #[test]
    fn max_attempts_saturates() {
        let config = RetryConfig {
            max_retries: u32::MAX,
            delay: Duration::ZERO,
        };
        assert_eq!(config.max_attempts(), u32::MAX);
    }

    #[test]
    fn exit_code_classification() {
        assert_eq!(AttemptResult::from_exit_code(Some(0)), AttemptResult::Success);
        assert_eq!(
            AttemptResult::from_exit_code(Some(2)),
            AttemptResult::Failure(FailureKind::Exit(2))
        );
        assert_eq!(
            AttemptResult::from_exit_code(None),
            AttemptResult::Failure(FailureKind::Terminated)
        );
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::Exit(3).to_string(), "exit code 3");
        assert_eq!(
            FailureKind::Terminated.to_string(),
            "terminated without exit code"
        );
        assert_eq!(
            FailureKind::Spawn("No such file or directory".into()).to_string(),
            "failed to launch: No such file or directory"
        );
    }

    #[test]
    fn outcome_accessors() {
        let ok = ItemOutcome::Succeeded { attempts: 2 };
        assert!(ok.is_success());
        assert_eq!(ok.attempts(), 2);
        assert_eq!(ok.last_exit_code(), Some(0));

        let failed = ItemOutcome::FailedAfterRetries {
            last_failure: FailureKind::Exit(9),
            attempts: 4,
        };
        assert!(!failed.is_success());
        assert_eq!(failed.attempts(), 4);
        assert_eq!(failed.last_exit_code(), Some(9));

        let spawn = ItemOutcome::FailedAfterRetries {
            last_failure: FailureKind::Spawn("missing".into()),
            attempts: 1,
        };
        assert_eq!(spawn.last_exit_code(), None);
    }

    #[test]
    fn work_item_name_and_display() {
        let item = WorkItem::new("/data/inputs/apple.com.txt");
        assert_eq!(item.name(), "apple.com.txt");
        assert_eq!(item.to_string(), "/data/inputs/apple.com.txt");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed = ItemOutcome::FailedAfterRetries {
            last_failure: FailureKind::Exit(1),
            attempts: 2,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed_after_retries");
        assert_eq!(json["attempts"], 2);
        assert_eq!(json["last_failure"]["kind"], "exit");
        assert_eq!(json["last_failure"]["detail"], 1);
    }
}
