//! Invocation of the external processing command.
//!
//! [`CommandRunner`] is the seam between the retry loop and the outside world:
//! one call is one attempt. [`ProcessRunner`] is the real implementation that
//! spawns a child process and waits for it to exit.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::state_machine::{AttemptResult, FailureKind, WorkItem};

/// Placeholder in command arguments replaced by the item path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs one attempt of the external command for a work item.
pub trait CommandRunner {
    async fn run(&self, item: &WorkItem) -> AttemptResult;
}

/// Program plus argument template for the external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Arguments for `item`. Every `{input}` is replaced by the item path;
    /// without any placeholder the path is appended as the last argument.
    pub fn render(&self, item: &WorkItem) -> Vec<OsString> {
        if !self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
            args.push(item.path().as_os_str().to_os_string());
            return args;
        }

        self.args
            .iter()
            .map(|arg| {
                if arg == INPUT_PLACEHOLDER {
                    item.path().as_os_str().to_os_string()
                } else {
                    let path = item.path().to_string_lossy();
                    OsString::from(arg.replace(INPUT_PLACEHOLDER, &path))
                }
            })
            .collect()
    }

    /// Human-readable command line for `item`.
    pub fn display_for(&self, item: &WorkItem) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.render(item)
                    .into_iter()
                    .map(|a| a.to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Spawns the external command as a child process with inherited stdio.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    template: CommandTemplate,
    program: PathBuf,
    working_dir: PathBuf,
}

impl ProcessRunner {
    /// Runner whose children start in `working_dir`. A relative program
    /// path containing a separator is resolved against `working_dir`; a bare
    /// name is looked up on `PATH`.
    pub fn new(template: CommandTemplate, working_dir: &Path) -> Self {
        let program = resolve_program(&template.program, working_dir);
        Self {
            template,
            program,
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, item: &WorkItem) -> AttemptResult {
        let args = self.template.render(item);
        debug!(
            program = %self.program.display(),
            cwd = %self.working_dir.display(),
            ?args,
            "spawning external command"
        );

        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .status()
            .await;

        match status {
            Ok(status) => AttemptResult::from_exit_code(status.code()),
            Err(e) => AttemptResult::Failure(FailureKind::Spawn(e.to_string())),
        }
    }
}

fn resolve_program(program: &str, working_dir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        working_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
