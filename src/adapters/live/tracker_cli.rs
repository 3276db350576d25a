//! Live tracker-CLI adapter that shells out to a real binary.

use std::process::Command;

use crate::ports::tracker_cli::{CliOutput, TrackerCli};

/// Live tracker CLI adapter backed by a real subprocess.
///
/// Arguments are always passed as an argv list; a multi-line `body` is
/// written to a fresh temp file and appended as `--body-file <path>`
/// rather than interpolated into a shell command string.
pub struct LiveTrackerCli {
    binary: String,
}

impl LiveTrackerCli {
    /// Creates a new live adapter invoking `binary` (e.g. `"gh"`).
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for LiveTrackerCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl TrackerCli for LiveTrackerCli {
    fn invoke(
        &self,
        args: &[String],
        body: Option<&str>,
    ) -> Result<CliOutput, Box<dyn std::error::Error + Send + Sync>> {
        let mut full_args: Vec<String> = args.to_vec();
        let _body_file = match body {
            Some(contents) => {
                let file = tempfile::NamedTempFile::new()?;
                std::fs::write(file.path(), contents)?;
                full_args.push("--body-file".to_string());
                full_args.push(file.path().display().to_string());
                Some(file)
            }
            None => None,
        };

        let output = Command::new(&self.binary).args(&full_args).output()?;
        Ok(CliOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
        // `_body_file` drops here, deleting the temp file (RAII cleanup
        // on every exit path, including early `?` returns above since the
        // file is created only after the args vector is already built).
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_missing_binary_surfaces_error() {
        let cli = LiveTrackerCli::new("definitely-not-a-real-binary-xyz");
        let result = cli.invoke(&["issue".to_string(), "list".to_string()], None);
        assert!(result.is_err());
    }
}
