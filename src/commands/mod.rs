//! Command dispatch and handlers.

pub mod status;
pub mod sync;

use crate::cli::Command;
use crate::context::ServiceContext;

const DEFAULT_TRACKER_BINARY: &str = "gh";

/// Dispatch a parsed command to its handler.
///
/// Always runs against a live `ServiceContext`; recording is opted into
/// separately via `SPECSYNC_RECORD` in `main`. The tracker CLI binary is
/// read from `config_path` up front so `ServiceContext` can be wired with
/// it; a config load failure here just falls back to the default binary
/// and is re-reported with full detail by the command handler's own load.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command, config_path: &str) -> Result<(), String> {
    let binary = crate::config::load_from_path(std::path::Path::new(config_path))
        .map(|c| c.github.binary)
        .unwrap_or_else(|_| DEFAULT_TRACKER_BINARY.to_string());
    let ctx = ServiceContext::live(&binary);
    dispatch_with_context(command, &ctx, config_path)
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(command: &Command, ctx: &ServiceContext, config_path: &str) -> Result<(), String> {
    match command {
        Command::Sync { name, all, dry_run, force } => {
            sync::run(ctx, config_path, name.as_deref(), *all, *dry_run, *force)
        }
        Command::Status { name } => status::run(ctx, config_path, name.as_deref()),
    }
}
