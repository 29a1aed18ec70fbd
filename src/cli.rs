//! Command-line interface built on clap.
//!
//! Every flag is optional: a bare `batchrun` processes the configured input
//! directory with the configured command. Flags only override settings from
//! [`BatchConfig`].

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::BatchConfig;

/// batchrun: run an external command once per input file, retrying failures.
#[derive(Debug, Parser)]
#[command(name = "batchrun", version, about)]
pub struct Cli {
    /// Config file to load instead of `batchrun.toml` in the base directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory relative paths are resolved against (default: the
    /// executable's directory, or $BATCHRUN_BASE_DIR).
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Directory holding the input files.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Retries per item after the first failed attempt.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Seconds to wait between attempts.
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Exit with a non-zero code when any item fails.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// List the items and command lines without running anything.
    #[arg(long, short = 'n', default_value_t = false)]
    pub dry_run: bool,

    /// Write a JSON report of the run to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only show warnings and errors.
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut BatchConfig) {
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_delay {
            config.retry_delay_secs = delay;
        }
        if self.strict {
            config.strict_exit = true;
        }
    }
}
