//! Terminal decoration for a run: item separators, the retry wait spinner
//! and the final summary.
//!
//! Uses `indicatif` for the spinner and `console` for colours. Log lines
//! themselves go through `tracing`.

use std::time::Duration;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::report::RunReport;
use crate::runner::CommandTemplate;
use crate::state_machine::WorkItem;

/// Visual progress for a batch run.
pub struct RunProgress {
    // Suppresses the wait spinner; separators and the summary always print.
    quiet: bool,
    green: Style,
    red: Style,
    dim: Style,
}

impl RunProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Progress without spinners.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::new(true)
    }

    /// Spinner shown while waiting before `next_attempt`. Hidden in quiet
    /// mode and when stderr is not a terminal.
    pub fn wait_spinner(&self, delay: Duration, next_attempt: u32, max_attempts: u32) -> ProgressBar {
        if self.quiet || !Term::stderr().is_term() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.yellow} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "waiting {}s before attempt {next_attempt}/{max_attempts}",
            delay.as_secs_f32()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Separator printed after each item, quiet or not.
    pub fn separator(&self) {
        println!("{}", self.dim.apply_to(separator_line()));
    }

    /// Final one-line verdict for the run.
    pub fn summary(&self, report: &RunReport) {
        let line = summary_line(report);
        if report.status.all_succeeded() {
            println!("{} {line}", self.green.apply_to("✓"));
        } else {
            println!("{} {line}", self.red.apply_to("✗"));
        }
    }

    /// Items a dry run would process, one command line each.
    pub fn dry_run_listing(&self, items: &[WorkItem], template: &CommandTemplate) {
        println!(
            "{}",
            self.dim
                .apply_to(format!("Dry run: {} item(s) would be processed", items.len()))
        );
        for item in items {
            println!("  {}", template.display_for(item));
        }
    }
}

fn separator_line() -> String {
    "─".repeat(60)
}

fn summary_line(report: &RunReport) -> String {
    let total = report.items.len();
    if report.status.all_succeeded() {
        format!("All {total} item(s) succeeded")
    } else {
        format!(
            "{} of {total} item(s) failed, inspect the logs above",
            report.failed_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ItemReport;
    use crate::state_machine::{FailureKind, ItemOutcome};
    use chrono::Utc;

    fn report_with(outcomes: Vec<ItemOutcome>) -> RunReport {
        let mut report = RunReport::begin();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            report.push(ItemReport::new(
                &WorkItem::new(format!("{i}.txt")),
                outcome,
                Utc::now(),
            ));
        }
        report.finish()
    }

    #[test]
    fn summary_when_everything_succeeded() {
        let report = report_with(vec![
            ItemOutcome::Succeeded { attempts: 1 },
            ItemOutcome::Succeeded { attempts: 3 },
        ]);
        assert_eq!(summary_line(&report), "All 2 item(s) succeeded");
    }

    #[test]
    fn summary_points_at_logs_on_failure() {
        let report = report_with(vec![
            ItemOutcome::Succeeded { attempts: 1 },
            ItemOutcome::FailedAfterRetries {
                last_failure: FailureKind::Exit(1),
                attempts: 2,
            },
        ]);
        assert_eq!(
            summary_line(&report),
            "1 of 2 item(s) failed, inspect the logs above"
        );
    }

    #[test]
    fn separator_is_a_fixed_rule() {
        let line = separator_line();
        assert_eq!(line.chars().count(), 60);
        assert!(line.chars().all(|c| c == '─'));
    }

    #[test]
    fn hidden_progress_never_draws_a_spinner() {
        let progress = RunProgress::hidden();
        let pb = progress.wait_spinner(Duration::from_secs(5), 2, 4);
        assert!(pb.is_hidden());
    }
}
