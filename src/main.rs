mod cli;
mod config;
mod discovery;
mod error;
mod executor;
mod logging;
mod report;
mod runner;
mod state_machine;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use cli::Cli;
use config::BatchConfig;
use executor::RetryExecutor;
use report::RunExit;
use runner::ProcessRunner;
use ui::RunProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match run(&cli).await {
        Ok(exit) => exit.into(),
        Err(err) => {
            error!("{err:#}");
            RunExit::SetupFailure.into()
        }
    }
}

/// Any error returned here happened before the first item was processed.
async fn run(cli: &Cli) -> Result<RunExit> {
    let base_dir = config::resolve_base_dir(cli.base_dir.as_deref())?;
    let mut config = BatchConfig::load(&base_dir, cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    let input_dir = config.input_dir_in(&base_dir);
    info!(
        base_dir = %base_dir.display(),
        input_dir = %input_dir.display(),
        max_retries = config.max_retries,
        retry_delay_secs = config.retry_delay_secs,
        "starting batch run"
    );

    let items = discovery::enumerate(&input_dir, &config.suffix)?;
    info!("found {} input file(s)", items.len());

    let progress = RunProgress::new(cli.quiet);
    let runner = ProcessRunner::new(config.command(), &base_dir);

    if cli.dry_run {
        progress.dry_run_listing(&items, runner.template());
        return Ok(RunExit::Success);
    }

    let executor = RetryExecutor::new(runner, config.retry_config(), progress);
    let report = executor.run_all(&items).await;
    executor.progress().summary(&report);

    if let Some(path) = &cli.report {
        match report.write_json(path) {
            Ok(()) => info!(path = %path.display(), "run report written"),
            Err(err) => error!("{err:#}"),
        }
    }

    Ok(report.exit(config.strict_exit))
}
