use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::report::{ItemReport, RunReport};
use crate::runner::CommandRunner;
use crate::state_machine::{ItemOutcome, RetryConfig, RetryMachine, Transition, WorkItem};
use crate::ui::RunProgress;

/// Runs work items one at a time through the external command, retrying
/// failed attempts with a fixed delay.
pub struct RetryExecutor<R> {
    runner: R,
    config: RetryConfig,
    progress: RunProgress,
}

impl<R: CommandRunner> RetryExecutor<R> {
    pub fn new(runner: R, config: RetryConfig, progress: RunProgress) -> Self {
        Self {
            runner,
            config,
            progress,
        }
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Process every item in order. An item that exhausts its retries is
    /// recorded and the run moves on to the next one.
    pub async fn run_all(&self, items: &[WorkItem]) -> RunReport {
        let mut report = RunReport::begin();
        let total = items.len();

        for (index, item) in items.iter().enumerate() {
            info!(item = %item, "[{}/{total}] processing {}", index + 1, item.name());
            report.push(self.execute(item).await);
            self.progress.separator();
        }

        report.finish()
    }

    /// Drive one item to its terminal outcome.
    pub async fn execute(&self, item: &WorkItem) -> ItemReport {
        let started_at = Utc::now();
        let mut machine = RetryMachine::new(self.config.clone());
        let max_attempts = machine.max_attempts();

        let outcome = loop {
            let attempt = machine.attempt();
            info!(item = %item, attempt, max_attempts, "attempt {attempt}/{max_attempts}");

            let result = self.runner.run(item).await;
            match machine.next(result) {
                Transition::Retry { next, reason } => {
                    warn!(
                        item = %item,
                        attempt,
                        exit_code = ?reason.exit_code(),
                        "attempt {attempt}/{max_attempts} failed ({reason}), retrying in {}s",
                        self.config.delay.as_secs_f32()
                    );
                    self.pause(next, max_attempts).await;
                }
                Transition::Complete(outcome) => break outcome,
            }
        };

        debug_assert!(machine.state().is_terminal());
        debug!(item = %item, history = ?machine.history(), state = %machine.state(), "item finished");
        match &outcome {
            ItemOutcome::Succeeded { attempts } => {
                info!(item = %item, attempts, "{} succeeded after {attempts} attempt(s)", item.name());
            }
            ItemOutcome::FailedAfterRetries {
                last_failure,
                attempts,
            } => {
                error!(
                    item = %item,
                    attempts,
                    exit_code = ?last_failure.exit_code(),
                    "{} failed after {attempts} attempt(s): {last_failure}",
                    item.name()
                );
            }
        }

        ItemReport::new(item, outcome, started_at)
    }

    async fn pause(&self, next_attempt: u32, max_attempts: u32) {
        if self.config.delay.is_zero() {
            return;
        }
        let spinner = self
            .progress
            .wait_spinner(self.config.delay, next_attempt, max_attempts);
        sleep(self.config.delay).await;
        spinner.finish_and_clear();
    }
}
