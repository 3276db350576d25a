//! Replaying adapter for the `TrackerCli` port.

use std::sync::Mutex;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::tracker_cli::{CliOutput, TrackerCli};

/// Replays recorded tracker-CLI invocations from a cassette.
pub struct ReplayingTrackerCli {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingTrackerCli {
    /// Creates a new replaying tracker CLI from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl TrackerCli for ReplayingTrackerCli {
    fn invoke(
        &self,
        _args: &[String],
        _body: Option<&str>,
    ) -> Result<CliOutput, Box<dyn std::error::Error + Send + Sync>> {
        let output = {
            let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
            let interaction = replayer.next_interaction("tracker_cli", "invoke");
            interaction.output.clone()
        };
        if let Some(err) = output.get("Err").or_else(|| output.get("err")) {
            let msg = err.as_str().unwrap_or("replayed error").to_string();
            return Err(msg.into());
        }
        let value = output.get("Ok").or_else(|| output.get("ok")).unwrap_or(&output);
        serde_json::from_value(value.clone())
            .map_err(|e| format!("tracker_cli::invoke: failed to deserialize: {e}").into())
    }
}
