//! Binary entrypoint for the `specsync` CLI.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // If SPECSYNC_RECORD is set, create a recording context that writes a
    // cassette file on drop. This is an internal developer mechanism and
    // is not exposed in --help.
    let _recording_ctx = std::env::var("SPECSYNC_RECORD")
        .ok()
        .map(|path| specsync::context::ServiceContext::recording(std::path::Path::new(&path), "gh"));

    match specsync::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
