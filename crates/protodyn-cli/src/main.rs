//! `protodyn` binary.
//!
//! Argument errors exit with status 2 (clap) before any I/O; runtime
//! failures are logged and exit with status 1.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use protodyn_cli::cli::{Cli, Commands};
use protodyn_cli::config::{self, LogFormat, ProtodynConfig};
use protodyn_cli::obs;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match config::resolve(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            obs::init_tracing(cli.verbose, LogFormat::Text);
            tracing::error!("loading config: {e}");
            return ExitCode::from(1);
        }
    };
    obs::init_tracing(cli.verbose, cfg.log.format);
    tracing::debug!(?cfg, "config loaded");

    match run(&cli, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli, cfg: &ProtodynConfig) -> anyhow::Result<()> {
    let command = match &cli.command {
        Commands::Emit(_) => "emit",
        Commands::Parse(_) => "parse",
        Commands::Schema(_) => "schema",
    };
    protodyn_cli::run(cli, cfg).with_context(|| format!("{command} failed"))
}
