mod item;
mod state;

pub use item::{AttemptResult, FailureKind, ItemOutcome, RetryConfig, WorkItem};
pub use state::{RetryMachine, Transition};
