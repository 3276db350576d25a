//! Tracker CLI port for invoking an external issue-tracker command-line tool.
//!
//! The reference adapter never builds a shell string; every invocation is
//! an argv list, and multi-line bodies travel through a temp file rather
//! than command-line interpolation.

/// Captured result of one external tracker-CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CliOutput {
    /// Process exit code (0 on success by convention).
    pub status: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl CliOutput {
    /// Returns `true` if the process exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Invokes an external issue-tracker command-line tool.
///
/// Abstracting subprocess invocation allows deterministic replay during
/// tests and cassette playback, and keeps the argv-list discipline in one
/// place rather than duplicated across call sites.
pub trait TrackerCli: Send + Sync {
    /// Runs the tracker binary with the given argument list.
    ///
    /// `body` is an optional multi-line payload (e.g. an issue body) that
    /// the implementation writes to a fresh temp file and appends as a
    /// `--body-file <path>` pair to `args` before spawning; this keeps
    /// multi-line content out of the argument vector itself while never
    /// invoking a shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be spawned at all (not found,
    /// permission denied). A non-zero exit code is reported via
    /// `CliOutput::status`, not as an `Err`.
    fn invoke(
        &self,
        args: &[String],
        body: Option<&str>,
    ) -> Result<CliOutput, Box<dyn std::error::Error + Send + Sync>>;
}
