//! Service context bundling all port trait objects.

use std::path::Path;

use crate::adapters::replaying::{ReplayingClock, ReplayingFileSystem, ReplayingIdGenerator, ReplayingTrackerCli};
use crate::cassette::config::CassetteConfig;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::id_gen::IdGenerator;
use crate::ports::tracker_cli::{CliOutput, TrackerCli};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// ID generator for unique identifiers.
    pub id_gen: Box<dyn IdGenerator>,
    /// Tracker CLI for invoking the external issue-tracker tool.
    pub tracker_cli: Box<dyn TrackerCli>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<CassetteRecorder>,
}

impl ServiceContext {
    /// Creates a live context backed by real adapters, invoking the
    /// tracker CLI through `binary` (e.g. `"gh"`, or a configured fork).
    #[must_use]
    pub fn live(binary: &str) -> Self {
        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::id_gen::LiveIdGenerator;
        use crate::adapters::live::tracker_cli::LiveTrackerCli;

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            id_gen: Box::new(LiveIdGenerator::new()),
            tracker_cli: Box::new(LiveTrackerCli::new(binary)),
            recorder: None,
        }
    }

    /// Creates a recording context that writes a cassette file on drop.
    ///
    /// Uses live adapters for actual work, wrapped to capture every port
    /// interaction. The cassette is written to `path` when this context
    /// is dropped. `binary` is the tracker CLI to invoke, same as `live`.
    #[must_use]
    pub fn recording(path: &Path, binary: &str) -> Self {
        use std::sync::{Arc, Mutex};

        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::id_gen::LiveIdGenerator;
        use crate::adapters::live::tracker_cli::LiveTrackerCli;
        use crate::adapters::recording::{
            RecordingClock, RecordingFileSystem, RecordingIdGenerator, RecordingTrackerCli,
        };

        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "specsync-session", "unknown")));

        Self {
            clock: Box::new(RecordingClock::new(Box::new(LiveClock), Arc::clone(&recorder))),
            fs: Box::new(RecordingFileSystem::new(Box::new(LiveFileSystem), Arc::clone(&recorder))),
            id_gen: Box::new(RecordingIdGenerator::new(Box::new(LiveIdGenerator::new()), Arc::clone(&recorder))),
            tracker_cli: Box::new(RecordingTrackerCli::new(
                Box::new(LiveTrackerCli::new(binary)),
                Arc::clone(&recorder),
            )),
            recorder: Some(
                Arc::try_unwrap(recorder)
                    .ok()
                    .expect("no other recorder references outstanding")
                    .into_inner()
                    .expect("recorder mutex poisoned"),
            ),
        }
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// Each port gets its own replayer from the same cassette so that
    /// per-port cursors are independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: crate::cassette::format::Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        Ok(Self {
            clock: Box::new(ReplayingClock::new(crate::cassette::replayer::CassetteReplayer::new(&cassette))),
            fs: Box::new(ReplayingFileSystem::new(crate::cassette::replayer::CassetteReplayer::new(&cassette))),
            id_gen: Box::new(ReplayingIdGenerator::new(crate::cassette::replayer::CassetteReplayer::new(&cassette))),
            tracker_cli: Box::new(ReplayingTrackerCli::new(crate::cassette::replayer::CassetteReplayer::new(&cassette))),
            recorder: None,
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette file use a panicking adapter
    /// that fails with a clear message when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;

        Ok(Self {
            clock: match replayers.clock {
                Some(r) => Box::new(ReplayingClock::new(r)),
                None => Box::new(PanickingClock),
            },
            fs: match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(PanickingFileSystem),
            },
            id_gen: match replayers.id_gen {
                Some(r) => Box::new(ReplayingIdGenerator::new(r)),
                None => Box::new(PanickingIdGenerator),
            },
            tracker_cli: match replayers.tracker_cli {
                Some(r) => Box::new(ReplayingTrackerCli::new(r)),
                None => Box::new(PanickingTrackerCli),
            },
            recorder: None,
        })
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            if let Err(e) = recorder.finish() {
                eprintln!("Warning: failed to write cassette: {e}");
            }
        }
    }
}

// --- Panicking adapters for unspecified ports ---

struct PanickingClock;
impl Clock for PanickingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        panic!("Clock port not configured in CassetteConfig — no cassette loaded for clock");
    }
}

struct PanickingFileSystem;
impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn write(&self, _path: &Path, _contents: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn exists(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn list_dir(&self, _path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn is_dir(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn is_file(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn is_symlink(&self, _path: &Path) -> bool {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn create_dir_all(&self, _path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
    fn rename(&self, _from: &Path, _to: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        panic!("FileSystem port not configured in CassetteConfig — no cassette loaded for fs");
    }
}

struct PanickingIdGenerator;
impl IdGenerator for PanickingIdGenerator {
    fn generate_id(&self) -> String {
        panic!("IdGenerator port not configured in CassetteConfig — no cassette loaded for id_gen");
    }
}

struct PanickingTrackerCli;
impl TrackerCli for PanickingTrackerCli {
    fn invoke(
        &self,
        _args: &[String],
        _body: Option<&str>,
    ) -> Result<CliOutput, Box<dyn std::error::Error + Send + Sync>> {
        panic!(
            "TrackerCli port not configured in CassetteConfig — no cassette loaded for tracker_cli"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette =
            Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions };
        let yaml = serde_yaml::to_string(&cassette).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    #[test]
    fn replaying_context_from_monolithic_cassette() {
        let dir = std::env::temp_dir().join("specsync_ctx_test_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("full.cassette.yaml");

        write_cassette(
            &path,
            vec![
                Interaction {
                    seq: 0,
                    port: "clock".into(),
                    method: "now".into(),
                    input: json!({}),
                    output: json!("2024-06-15T10:30:00Z"),
                },
                Interaction {
                    seq: 1,
                    port: "id_gen".into(),
                    method: "generate_id".into(),
                    input: json!({}),
                    output: json!("uuid-001"),
                },
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        let time = ctx.clock.now();
        assert_eq!(time.to_rfc3339(), "2024-06-15T10:30:00+00:00");
        let id = ctx.id_gen.generate_id();
        assert_eq!(id, "uuid-001");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn replaying_from_per_port_cassettes() {
        let dir = std::env::temp_dir().join("specsync_ctx_test_ports");
        std::fs::create_dir_all(&dir).unwrap();

        let clock_path = dir.join("clock.cassette.yaml");
        write_cassette(
            &clock_path,
            vec![Interaction {
                seq: 0,
                port: "clock".into(),
                method: "now".into(),
                input: json!({}),
                output: json!("2024-01-01T00:00:00Z"),
            }],
        );

        let config = CassetteConfig { clock: Some(clock_path), ..CassetteConfig::default() };
        let ctx = ServiceContext::replaying_from(&config).unwrap();
        let time = ctx.clock.now();
        assert_eq!(time.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[should_panic(expected = "not configured in CassetteConfig")]
    fn replaying_from_panics_on_unconfigured_port() {
        let config = CassetteConfig::default();
        let ctx = ServiceContext::replaying_from(&config).unwrap();
        let _ = ctx.fs.exists(Path::new("/tmp/anything"));
    }
}
