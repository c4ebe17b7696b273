//! CLI commands and argument parsing

use crate::types::SyncMode;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Asana Airdrop connector CLI
#[derive(Parser, Debug)]
#[command(name = "asana-airdrop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Checkpoint file, created if missing
    #[arg(short, long, global = true, default_value = "state.json")]
    pub state: PathBuf,

    /// Directory extracted items are written to as JSON lines
    #[arg(short, long, global = true, default_value = "output")]
    pub output: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials, taken from the environment when not given as flags
#[derive(clap::Args, Debug, Clone)]
pub struct Credentials {
    /// Asana personal access token
    #[arg(long, env = "ASANA_TOKEN", hide_env_values = true)]
    pub key: String,

    /// Asana workspace gid
    #[arg(long, env = "ASANA_WORKSPACE")]
    pub workspace: String,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle one event read from a JSON file
    Handle {
        /// Event file
        #[arg(short, long)]
        event: PathBuf,

        /// Keep invoking continue events until the phase is done or fails
        #[arg(long)]
        follow: bool,
    },

    /// List the projects of a workspace as sync units
    Discover {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Print the external domain metadata
    Metadata,

    /// Extract users, tasks and attachments of a project
    Extract {
        #[command(flatten)]
        credentials: Credentials,

        /// Project gid
        #[arg(long)]
        project: String,

        /// Sync mode
        #[arg(long, value_enum, default_value = "full")]
        mode: ModeArg,

        /// Only take tasks modified at or after this time (RFC3339)
        #[arg(long)]
        extract_from: Option<DateTime<Utc>>,

        /// Walk everything again instead of narrowing by the last sync
        #[arg(long)]
        reset_extract_from: bool,

        /// Discard the stored checkpoint before starting
        #[arg(long)]
        reset: bool,

        /// Continue an interrupted extraction instead of starting one
        #[arg(long, conflicts_with = "reset")]
        resume: bool,
    },

    /// Load tasks and their attachments from a JSON file into a project
    Load {
        #[command(flatten)]
        credentials: Credentials,

        /// Project gid
        #[arg(long)]
        project: String,

        /// File with `items`, `attachments` and `mappings` as in an event's
        /// `event_data`
        #[arg(long)]
        items: PathBuf,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Sync mode flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Walk everything
    Full,
    /// Only changes since the last successful sync
    Incremental,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => SyncMode::Full,
            ModeArg::Incremental => SyncMode::Incremental,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "asana-airdrop",
            "--state",
            "/tmp/s.json",
            "extract",
            "--key",
            "pat",
            "--workspace",
            "w1",
            "--project",
            "p1",
            "--mode",
            "incremental",
            "--extract-from",
            "2024-01-01T00:00:00Z",
        ])
        .unwrap();

        assert_eq!(cli.state, PathBuf::from("/tmp/s.json"));
        match cli.command {
            Commands::Extract {
                project,
                mode,
                extract_from,
                reset,
                ..
            } => {
                assert_eq!(project, "p1");
                assert_eq!(SyncMode::from(mode), SyncMode::Incremental);
                assert!(extract_from.is_some());
                assert!(!reset);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_reset_conflicts_with_resume() {
        let result = Cli::try_parse_from([
            "asana-airdrop",
            "extract",
            "--key",
            "pat",
            "--workspace",
            "w1",
            "--project",
            "p1",
            "--reset",
            "--resume",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_handle() {
        let cli = Cli::try_parse_from(["asana-airdrop", "handle", "-e", "event.json", "--follow"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Handle { follow: true, .. }));
        assert_eq!(cli.output, PathBuf::from("output"));
    }
}
