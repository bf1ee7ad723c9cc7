//! Subcommand implementations.

use std::io::{self, Write};

use eyre::{Result, WrapErr};
use tally_net_servers::{ServerCache, ServerRecord};
use tracing::warn;

use crate::cli::Commands;
use crate::config::TallyConfig;

pub(crate) fn run(command: Commands, config: &TallyConfig) -> Result<()> {
    let cache = ServerCache::with_config(
        &config.cache_path,
        config.server_list(),
        config.cache.clone(),
    );

    // A failed write still leaves a usable in-memory table
    if let Err(e) = cache.load() {
        warn!(error = %e, path = %config.cache_path.display(), "could not persist reconciled cache");
    }

    let mut out = io::stdout().lock();
    match command {
        Commands::Show => {
            let mut records = cache.records();
            records.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
            for record in &records {
                writeln!(out, "{}", format_record(record))?;
            }
        }
        Commands::Select { transport, count } => {
            for url in cache.select(transport, count) {
                writeln!(out, "{url}")?;
            }
        }
        Commands::Latency { url, millis } => {
            if cache.get(&url).is_none() {
                eyre::bail!("unknown server {url}");
            }
            cache.record_response_time(&url, millis);
            cache
                .save()
                .wrap_err_with(|| format!("failed to save {}", config.cache_path.display()))?;
            if let Some(record) = cache.get(&url) {
                writeln!(out, "{}", format_record(&record))?;
            }
        }
    }

    Ok(())
}

fn format_record(record: &ServerRecord) -> String {
    let response_time = record
        .response_time
        .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
    format!("{:>5} {:>10} {}", record.score, response_time, record.url)
}
