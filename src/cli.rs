//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `specsync`.
#[derive(Debug, Parser)]
#[command(name = "specsync", version, about = "Keeps spec documents in sync with a remote issue tracker")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = ".specsync.yml")]
    pub config: String,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Push one spec, or every auto-syncing spec, to the remote tracker.
    Sync {
        /// Spec directory name to sync. Omit with `--all` to sync everything.
        name: Option<String>,
        /// Sync every spec under the configured root.
        #[arg(long)]
        all: bool,
        /// Report what would happen without mutating the remote or local files.
        #[arg(long)]
        dry_run: bool,
        /// Push even when the spec is already marked synced, or override a
        /// detected conflict.
        #[arg(long)]
        force: bool,
    },
    /// Show the sync status of one spec, or every spec under the root.
    Status {
        /// Spec directory name to report on. Omit to report on every spec.
        name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_sync_subcommand_with_name() {
        let cli = Cli::parse_from(["specsync", "sync", "001-login"]);
        assert!(matches!(cli.command, Command::Sync { name: Some(_), all: false, .. }));
    }

    #[test]
    fn parses_sync_all_flag() {
        let cli = Cli::parse_from(["specsync", "sync", "--all"]);
        assert!(matches!(cli.command, Command::Sync { all: true, .. }));
    }

    #[test]
    fn parses_sync_dry_run_and_force() {
        let cli = Cli::parse_from(["specsync", "sync", "--all", "--dry-run", "--force"]);
        match cli.command {
            Command::Sync { dry_run, force, .. } => {
                assert!(dry_run);
                assert!(force);
            }
            _ => panic!("expected Sync"),
        }
    }

    #[test]
    fn parses_status_subcommand() {
        let cli = Cli::parse_from(["specsync", "status"]);
        assert!(matches!(cli.command, Command::Status { name: None }));
    }

    #[test]
    fn parses_status_with_name() {
        let cli = Cli::parse_from(["specsync", "status", "001-login"]);
        assert!(matches!(cli.command, Command::Status { name: Some(_) }));
    }

    #[test]
    fn parses_global_config_flag() {
        let cli = Cli::parse_from(["specsync", "--config", "other.yml", "status"]);
        assert_eq!(cli.config, "other.yml");
    }

    #[test]
    fn config_flag_defaults_when_absent() {
        let cli = Cli::parse_from(["specsync", "status"]);
        assert_eq!(cli.config, ".specsync.yml");
    }
}
