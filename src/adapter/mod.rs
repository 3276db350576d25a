//! Tracker-neutral adapter abstraction.
//!
//! The sync engine depends only on this trait; `github` provides the one
//! concrete implementation this crate ships.

pub mod github;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::scanner::SpecDocument;

/// Describes which optional behaviors an adapter supports. The engine
/// branches on these values rather than matching on concrete adapter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterCapabilities {
    /// Whether `push_batch`/`pull_batch` do real batching rather than
    /// falling back to sequential per-item calls.
    pub supports_batch: bool,
    /// Whether non-`spec.md` files are linked as subtasks under a parent.
    pub supports_subtasks: bool,
    /// Whether labels are applied on push.
    pub supports_labels: bool,
    /// Whether assignees are applied on push.
    pub supports_assignees: bool,
    /// Whether milestones are applied on push.
    pub supports_milestones: bool,
    /// Whether comments can be added to a remote issue.
    pub supports_comments: bool,
    /// Whether `resolve_conflict` is implemented beyond `Manual`.
    pub supports_conflict_resolution: bool,
}

/// Whether a remote issue is the spec's parent or one of its subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRefKind {
    /// The top-level issue for a spec (`spec.md`).
    Parent,
    /// An issue linked under a parent.
    Subtask,
}

/// Opaque reference to a remote issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Remote issue number.
    pub id: u64,
    /// Web URL, if the tracker exposes one.
    pub url: Option<String>,
    /// Parent or subtask.
    pub kind: RemoteRefKind,
}

/// Result of pushing one spec: the parent issue, the `spec_id` that now
/// identifies it (minted fresh if the spec had none), and the resulting
/// issue number for every file that was actually pushed.
///
/// The engine uses `spec_id` and `issue_numbers` to write front-matter
/// identity back for every participating file, not just `spec.md`.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    /// The spec's top-level issue.
    pub parent: RemoteRef,
    /// The spec's stable identity, minted on first push.
    pub spec_id: Uuid,
    /// Filename (e.g. `"spec.md"`, `"plan.md"`) to the issue number it was
    /// pushed to.
    pub issue_numbers: BTreeMap<String, u64>,
}

/// Open/closed state of a remote issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    /// The issue is open.
    Open,
    /// The issue is closed.
    Closed,
}

/// Tracker-neutral projection of a remote issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Remote issue number.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue body (may contain the embedded UUID marker).
    pub body: String,
    /// Open/closed state.
    pub state: IssueState,
    /// Labels currently applied.
    pub labels: Vec<String>,
    /// Assignees currently applied.
    pub assignees: Vec<String>,
    /// Milestone number, if any.
    pub milestone: Option<u64>,
    /// Parent issue number, if this is a subtask.
    pub parent_issue: Option<u64>,
    /// Last-modified timestamp as reported by the tracker.
    pub updated_at: DateTime<Utc>,
}

/// Classification of a spec's relationship to the remote tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No identity fields and no matching remote issue — purely local.
    Local,
    /// Identity exists but no matching remote issue was found.
    Draft,
    /// Both local and remote changed since the last sync.
    Conflict,
    /// Local content hash matches `sync_hash` and remote is not newer.
    Synced,
    /// The status probe itself failed.
    Unknown,
}

/// Result of `Adapter::get_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    /// Overall classification.
    pub status: Status,
    /// Whether the local content hash differs from `sync_hash`.
    pub has_changes: bool,
    /// Matching remote issue number, if resolved.
    pub remote_id: Option<u64>,
    /// Last recorded sync timestamp, if any.
    pub last_sync: Option<DateTime<Utc>>,
    /// Human-readable conflict descriptions, non-empty iff `status == Conflict`.
    pub conflicts: Vec<String>,
}

/// How to resolve a detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Surface the conflict; do not mutate either side.
    #[default]
    Manual,
    /// Overwrite remote with local.
    Ours,
    /// Overwrite local files present in the remote projection with remote.
    Theirs,
    /// Not implemented in the core; callers must inject a prompt.
    Interactive,
}

/// Options controlling a push.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// Push even when the engine would otherwise skip (no changes).
    pub force: bool,
    /// Classify and report without mutating the adapter or local files.
    pub dry_run: bool,
}

/// Errors an adapter can surface, matching the taxonomy the engine maps to
/// `SyncResult.details.errors`.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The tracker CLI reported the caller is not authenticated.
    #[error("authentication required")]
    AuthRequired,
    /// The remote issue's embedded UUID does not match the local `spec_id`.
    #[error("spec_id mismatch: local={local}, remote={remote}")]
    UuidMismatch {
        /// Local `spec_id`.
        local: uuid::Uuid,
        /// UUID embedded in the remote issue body.
        remote: uuid::Uuid,
    },
    /// Both sides changed since the last sync and no strategy resolved it.
    #[error("sync conflict: {0:?}")]
    SyncConflict(Vec<String>),
    /// A transient or permanent failure to reach the tracker.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    /// Local data failed schema validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// `interactive` conflict resolution was requested but is not supported.
    #[error("interactive conflict resolution is not available")]
    InteractiveUnavailable,
    /// Any other adapter-internal failure (subprocess, parsing, ...).
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Tracker-specific operations the sync engine depends on.
pub trait Adapter: Send + Sync {
    /// Describes which optional operations this adapter supports.
    fn capabilities(&self) -> AdapterCapabilities;

    /// Probes whether the adapter is currently authenticated.
    fn check_auth(&self) -> bool;

    /// Creates or updates the remote issue(s) for one spec.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` on authentication, identity, or I/O failure.
    fn push(&self, spec: &SpecDocument, opts: &PushOptions) -> Result<PushOutcome, AdapterError>;

    /// Pushes many specs. The default implementation calls `push`
    /// sequentially; adapters that support real batching override this.
    ///
    /// # Errors
    ///
    /// Never returns `Err` itself: per-item failures are reported inline
    /// so that one failing spec does not abort the rest of the batch.
    fn push_batch(
        &self,
        specs: &[SpecDocument],
        opts: &PushOptions,
    ) -> Vec<Result<PushOutcome, AdapterError>> {
        specs.iter().map(|spec| self.push(spec, opts)).collect()
    }

    /// Fetches a remote issue (and its subtasks, if supported) as a fresh
    /// `SpecDocument`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the remote issue cannot be fetched.
    fn pull(&self, remote: &RemoteRef) -> Result<SpecDocument, AdapterError>;

    /// Computes the sync status of a spec relative to the remote.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the status probe itself fails.
    fn get_status(&self, spec: &SpecDocument) -> Result<SyncStatus, AdapterError>;

    /// Resolves a detected conflict according to `strategy`, returning the
    /// canonical spec document to write back.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InteractiveUnavailable` for `Interactive`, or
    /// any other adapter failure encountered while resolving.
    fn resolve_conflict(
        &self,
        local: &SpecDocument,
        remote: &SpecDocument,
        strategy: ConflictStrategy,
    ) -> Result<SpecDocument, AdapterError>;
}
