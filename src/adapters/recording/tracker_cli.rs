//! Recording adapter for the `TrackerCli` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::tracker_cli::{CliOutput, TrackerCli};

/// Records tracker-CLI interactions while delegating to an inner implementation.
pub struct RecordingTrackerCli {
    inner: Box<dyn TrackerCli>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTrackerCli {
    /// Creates a new recording tracker CLI wrapping the given implementation.
    pub fn new(inner: Box<dyn TrackerCli>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct InvokeInput<'a> {
    args: &'a [String],
    body: Option<&'a str>,
}

impl TrackerCli for RecordingTrackerCli {
    fn invoke(
        &self,
        args: &[String],
        body: Option<&str>,
    ) -> Result<CliOutput, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.invoke(args, body);
        let input = InvokeInput { args, body };
        record_result(&self.recorder, "tracker_cli", "invoke", &input, &result);
        result
    }
}
