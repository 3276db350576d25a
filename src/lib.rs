//! Core library entry for the `specsync` CLI.

pub mod adapter;
pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod frontmatter;
pub mod mapper;
pub mod ports;
pub mod scanner;

use clap::Parser;

/// Runs the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => return Err(err.to_string()),
        Err(err) => {
            // --help or --version: print to stdout and succeed.
            let _ = err.print();
            return Ok(());
        }
    };
    commands::dispatch(&cli.command, &cli.config)
}
