//! Run-level aggregation: the overall status flag, per-item records and the
//! process exit policy.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::state_machine::{ItemOutcome, WorkItem};

/// Aggregate success flag over every item of a run.
///
/// Starts true and only ever flips to false. Folded by value over item
/// outcomes rather than mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunStatus {
    all_succeeded: bool,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            all_succeeded: true,
        }
    }
}

impl RunStatus {
    pub fn record(self, outcome: &ItemOutcome) -> Self {
        Self {
            all_succeeded: self.all_succeeded && outcome.is_success(),
        }
    }

    pub fn all_succeeded(self) -> bool {
        self.all_succeeded
    }
}

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The run completed (exit 0).
    Success,
    /// Some items failed and strict exit is enabled (exit 1).
    PartialFailure,
    /// The run never started processing (exit 2).
    SetupFailure,
}

impl RunExit {
    pub fn code(self) -> u8 {
        match self {
            RunExit::Success => 0,
            RunExit::PartialFailure => 1,
            RunExit::SetupFailure => 2,
        }
    }
}

impl From<RunExit> for ExitCode {
    fn from(exit: RunExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Record of one processed item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item: PathBuf,
    pub outcome: ItemOutcome,
    pub attempts: u32,
    pub last_exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl ItemReport {
    pub fn new(item: &WorkItem, outcome: ItemOutcome, started_at: DateTime<Utc>) -> Self {
        let completed_at = Utc::now();
        Self {
            item: item.path().to_path_buf(),
            attempts: outcome.attempts(),
            last_exit_code: outcome.last_exit_code(),
            outcome,
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds(),
        }
    }
}

/// Everything a run produced, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(rename = "all_succeeded")]
    pub status: RunStatus,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn begin() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            status: RunStatus::default(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, report: ItemReport) {
        self.status = self.status.record(&report.outcome);
        self.items.push(report);
    }

    pub fn finish(mut self) -> Self {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at).num_milliseconds();
        self
    }

    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| !i.outcome.is_success()).count()
    }

    /// Exit policy: partial failure only affects the exit code when `strict`.
    pub fn exit(&self, strict: bool) -> RunExit {
        if strict && !self.status.all_succeeded() {
            RunExit::PartialFailure
        } else {
            RunExit::Success
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing run report to {}", path.display()))?;
        Ok(())
    }
}
