use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = wct::cli::Cli::parse();
    wct::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    wct::commands::run(cli)
}
