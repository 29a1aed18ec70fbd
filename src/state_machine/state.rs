use std::fmt;

use super::item::{AttemptResult, FailureKind, ItemOutcome, RetryConfig};

/// States of the per-item retry machine.
///
/// Each item flows through: ATTEMPTING(1) → … → ATTEMPTING(n) → SUCCEEDED | FAILED
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Attempt `n` (1-based) is about to run.
    Attempting(u32),
    Succeeded {
        attempts: u32,
    },
    Failed {
        last_failure: FailureKind,
        attempts: u32,
    },
}

impl State {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, State::Attempting(_))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Attempting(n) => write!(f, "ATTEMPTING({n})"),
            State::Succeeded { .. } => write!(f, "SUCCEEDED"),
            State::Failed { .. } => write!(f, "FAILED"),
        }
    }
}

/// The result of feeding one attempt result into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Wait for the retry delay, then run attempt `next`.
    Retry { next: u32, reason: FailureKind },
    /// The item reached its terminal outcome.
    Complete(ItemOutcome),
}

/// Drives one work item through its bounded attempts.
#[derive(Debug, Clone)]
pub struct RetryMachine {
    config: RetryConfig,
    state: State,
    history: Vec<State>,
}

impl RetryMachine {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            state: State::Attempting(1),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Every state the machine has left, oldest first.
    pub fn history(&self) -> &[State] {
        &self.history
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts()
    }

    /// The attempt about to run, or the number of attempts made once terminal.
    pub fn attempt(&self) -> u32 {
        match &self.state {
            State::Attempting(n) => *n,
            State::Succeeded { attempts } | State::Failed { attempts, .. } => *attempts,
        }
    }

    /// The terminal outcome, once reached.
    pub fn outcome(&self) -> Option<ItemOutcome> {
        match &self.state {
            State::Attempting(_) => None,
            State::Succeeded { attempts } => Some(ItemOutcome::Succeeded {
                attempts: *attempts,
            }),
            State::Failed {
                last_failure,
                attempts,
            } => Some(ItemOutcome::FailedAfterRetries {
                last_failure: last_failure.clone(),
                attempts: *attempts,
            }),
        }
    }

    /// Apply the result of the current attempt.
    ///
    /// - Success moves to `Succeeded`.
    /// - Failure with attempts left moves to `Attempting(n + 1)`; the caller
    ///   owes the retry delay before running it.
    /// - Failure on attempt `max_retries + 1` moves to `Failed`.
    /// - Terminal states absorb further results and repeat their outcome.
    pub fn next(&mut self, result: AttemptResult) -> Transition {
        if let Some(outcome) = self.outcome() {
            return Transition::Complete(outcome);
        }
        let n = self.attempt();

        let (next_state, transition) = match result {
            AttemptResult::Success => {
                let outcome = ItemOutcome::Succeeded { attempts: n };
                (State::Succeeded { attempts: n }, Transition::Complete(outcome))
            }
            AttemptResult::Failure(reason) if n < self.config.max_attempts() => (
                State::Attempting(n + 1),
                Transition::Retry {
                    next: n + 1,
                    reason,
                },
            ),
            AttemptResult::Failure(reason) => {
                let outcome = ItemOutcome::FailedAfterRetries {
                    last_failure: reason.clone(),
                    attempts: n,
                };
                (
                    State::Failed {
                        last_failure: reason,
                        attempts: n,
                    },
                    Transition::Complete(outcome),
                )
            }
        };

        let previous = std::mem::replace(&mut self.state, next_state);
        self.history.push(previous);
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn machine(max_retries: u32) -> RetryMachine {
        RetryMachine::new(RetryConfig {
            max_retries,
            delay: Duration::ZERO,
        })
    }

    fn fail(code: i32) -> AttemptResult {
        AttemptResult::Failure(FailureKind::Exit(code))
    }

    #[test]
    fn starts_at_first_attempt() {
        let m = machine(3);
        assert_eq!(m.state(), &State::Attempting(1));
        assert_eq!(m.attempt(), 1);
        assert_eq!(m.max_attempts(), 4);
        assert!(m.outcome().is_none());
        assert!(m.history().is_empty());
    }

    #[test]
    fn success_on_first_attempt() {
        let mut m = machine(3);
        let t = m.next(AttemptResult::Success);
        assert_eq!(t, Transition::Complete(ItemOutcome::Succeeded { attempts: 1 }));
        assert!(m.state().is_terminal());
        assert_eq!(m.history(), &[State::Attempting(1)]);
    }

    #[test]
    fn failure_retries_then_fails() {
        let mut m = machine(2);

        let t = m.next(fail(1));
        assert_eq!(
            t,
            Transition::Retry {
                next: 2,
                reason: FailureKind::Exit(1)
            }
        );
        assert_eq!(m.state(), &State::Attempting(2));

        let t = m.next(fail(2));
        assert!(matches!(t, Transition::Retry { next: 3, .. }));

        let t = m.next(fail(3));
        assert_eq!(
            t,
            Transition::Complete(ItemOutcome::FailedAfterRetries {
                last_failure: FailureKind::Exit(3),
                attempts: 3,
            })
        );
        assert_eq!(m.attempt(), 3);
        assert_eq!(
            m.history(),
            &[
                State::Attempting(1),
                State::Attempting(2),
                State::Attempting(3)
            ]
        );
    }

    #[test]
    fn zero_retries_fails_immediately() {
        let mut m = machine(0);
        let t = m.next(AttemptResult::Failure(FailureKind::Spawn("not found".into())));
        assert_eq!(
            t,
            Transition::Complete(ItemOutcome::FailedAfterRetries {
                last_failure: FailureKind::Spawn("not found".into()),
                attempts: 1,
            })
        );
    }

    #[test]
    fn retry_then_succeed() {
        let mut m = machine(3);
        assert!(matches!(m.next(fail(1)), Transition::Retry { next: 2, .. }));
        assert!(matches!(
            m.next(AttemptResult::Failure(FailureKind::Terminated)),
            Transition::Retry { next: 3, .. }
        ));
        let t = m.next(AttemptResult::Success);
        assert_eq!(t, Transition::Complete(ItemOutcome::Succeeded { attempts: 3 }));
    }

    #[test]
    fn failed_attempts_always_equal_max_retries_plus_one() {
        for max_retries in 0..6 {
            let mut m = machine(max_retries);
            let mut retries = 0;
            let outcome = loop {
                match m.next(fail(1)) {
                    Transition::Retry { .. } => retries += 1,
                    Transition::Complete(outcome) => break outcome,
                }
            };
            assert_eq!(retries, max_retries);
            assert_eq!(outcome.attempts(), max_retries + 1);
            assert!(!outcome.is_success());
        }
    }

    #[test]
    fn terminal_state_absorbs_further_results() {
        let mut m = machine(0);
        m.next(AttemptResult::Success);
        let t = m.next(fail(5));
        assert_eq!(t, Transition::Complete(ItemOutcome::Succeeded { attempts: 1 }));
        assert_eq!(m.history().len(), 1);
    }

    #[test]
    fn state_display() {
        assert_eq!(State::Attempting(2).to_string(), "ATTEMPTING(2)");
        assert_eq!(State::Succeeded { attempts: 1 }.to_string(), "SUCCEEDED");
        assert_eq!(
            State::Failed {
                last_failure: FailureKind::Terminated,
                attempts: 1
            }
            .to_string(),
            "FAILED"
        );
    }
}
