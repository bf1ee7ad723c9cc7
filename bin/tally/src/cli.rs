//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_net_servers::Transport;

/// Inspect and rank a server reputation cache.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Configuration file (TOML).
    #[arg(long, short, global = true, env = "TALLY_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) logs: LogArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "tally_net_servers=trace").
    #[arg(long = "log.filter", global = true, value_name = "DIRECTIVE")]
    pub(crate) filter: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print every known server with its score and response time.
    Show,

    /// Print the ranked shortlist a client would try next.
    Select {
        /// Only consider servers of this transport (tcp, stratum).
        #[arg(long, short)]
        transport: Option<Transport>,

        /// Number of servers to return.
        #[arg(long, short = 'n', default_value_t = 5)]
        count: usize,
    },

    /// Record a measured response time for one server and save.
    Latency {
        url: String,
        /// Response time in milliseconds.
        millis: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select() {
        let cli = Cli::try_parse_from(["tally", "select", "--transport", "stratum", "-n", "3"])
            .unwrap();
        match cli.command {
            Commands::Select { transport, count } => {
                assert_eq!(transport, Some(Transport::Stratum));
                assert_eq!(count, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_latency() {
        let cli = Cli::try_parse_from(["tally", "-vv", "latency", "tcp://a", "120"]).unwrap();
        assert_eq!(cli.logs.verbosity, 2);
        match cli.command {
            Commands::Latency { url, millis } => {
                assert_eq!(url, "tcp://a");
                assert_eq!(millis, 120);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["tally", "latency", "tcp://a", "fast"]).is_err());
    }
}
