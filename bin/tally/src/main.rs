//! Operator CLI for the server reputation cache.

mod cli;
mod commands;
mod config;
mod logging;

use clap::Parser;
use tracing::debug;

use crate::cli::Cli;
use crate::config::TallyConfig;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let config = TallyConfig::load(cli.config.as_deref())?;
    debug!(cache = %config.cache_path.display(), servers = config.servers.len(), "configuration loaded");

    commands::run(cli.command, &config)
}
