//! Sync engine: drives one spec (or the whole tree) through status
//! classification, conflict resolution, and remote push, writing the
//! resulting identity and hash back into front-matter.

use crate::adapter::{
    Adapter, AdapterError, ConflictStrategy, PushOptions, PushOutcome, RemoteRef, RemoteRefKind,
    Status,
};
use crate::frontmatter::{self, SyncStatus as FrontmatterSyncStatus};
use crate::scanner::{ScanError, Scanner, SpecDocument};

/// Per-bucket counts from a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncDetails {
    /// Specs that had no prior remote identity and were created.
    pub created: u32,
    /// Specs that already had a remote identity and were updated.
    pub updated: u32,
    /// Specs left untouched (already synced, or dry-run).
    pub skipped: u32,
}

/// Outcome of syncing one spec or a whole batch.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Whether every spec in scope synced without error.
    pub success: bool,
    /// Human-readable summary line.
    pub message: String,
    /// Per-bucket counts.
    pub details: SyncDetails,
    /// One entry per spec that failed, formatted as `"<name>: <error>"`.
    pub errors: Vec<String>,
}

impl SyncResult {
    fn skip(name: &str, reason: &str) -> Self {
        Self {
            success: true,
            message: format!("{name}: skipped ({reason})"),
            details: SyncDetails { skipped: 1, ..SyncDetails::default() },
            errors: Vec::new(),
        }
    }

    fn failed(name: &str, error: &str) -> Self {
        Self {
            success: false,
            message: format!("{name}: failed"),
            details: SyncDetails::default(),
            errors: vec![format!("{name}: {error}")],
        }
    }
}

/// Errors that can abort a sync run outright (as opposed to a per-spec
/// failure, which is collected into `SyncResult::errors`).
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The spec tree could not be scanned.
    #[error("failed to scan spec tree: {0}")]
    Scan(#[from] ScanError),
    /// No spec matched the requested name or issue number.
    #[error("no spec found matching {0:?}")]
    NotFound(String),
}

/// Coordinates the scanner and one adapter to push spec documents and
/// write their resulting sync state back to disk.
pub struct SyncEngine<'a> {
    scanner: Scanner<'a>,
    adapter: &'a dyn Adapter,
}

impl<'a> SyncEngine<'a> {
    /// Creates an engine over `scanner`, driving the given `adapter`.
    #[must_use]
    pub fn new(scanner: Scanner<'a>, adapter: &'a dyn Adapter) -> Self {
        Self { scanner, adapter }
    }

    /// Syncs every spec under the scanned root whose `spec.md` has
    /// `auto_sync` enabled (the default).
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Scan` if the tree cannot be walked.
    pub fn sync_all(&self, opts: &PushOptions, strategy: ConflictStrategy) -> Result<SyncResult, SyncError> {
        let docs = self.scanner.scan_all()?;
        let mut details = SyncDetails::default();
        let mut errors = Vec::new();

        for doc in &docs {
            let auto_sync = doc.files.get("spec.md").is_none_or(|f| f.frontmatter.auto_sync_enabled());
            if !auto_sync {
                details.skipped += 1;
                continue;
            }
            let result = self.sync_one(doc, opts, strategy);
            details.created += result.details.created;
            details.updated += result.details.updated;
            details.skipped += result.details.skipped;
            errors.extend(result.errors);
        }

        Ok(SyncResult {
            success: errors.is_empty(),
            message: format!(
                "synced {} spec(s): {} created, {} updated, {} skipped, {} failed",
                docs.len(),
                details.created,
                details.updated,
                details.skipped,
                errors.len()
            ),
            details,
            errors,
        })
    }

    /// Syncs the single spec directory named `name` under the scanned root.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Scan` if the tree cannot be walked, or
    /// `SyncError::NotFound` if no directory matches `name`.
    pub fn sync_named(
        &self,
        name: &str,
        opts: &PushOptions,
        strategy: ConflictStrategy,
    ) -> Result<SyncResult, SyncError> {
        let docs = self.scanner.scan_all()?;
        let doc = docs
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SyncError::NotFound(name.to_string()))?;
        Ok(self.sync_one(doc, opts, strategy))
    }

    /// Syncs one already-scanned spec document. Never returns `Err`: any
    /// adapter failure is captured in `SyncResult::errors` so that one
    /// failing spec does not abort a batch.
    fn sync_one(&self, doc: &SpecDocument, opts: &PushOptions, strategy: ConflictStrategy) -> SyncResult {
        if !self.adapter.check_auth() {
            return SyncResult::failed(&doc.name, &AdapterError::AuthRequired.to_string());
        }

        let status = match self.adapter.get_status(doc) {
            Ok(status) => status,
            Err(err) => return SyncResult::failed(&doc.name, &err.to_string()),
        };

        if status.status == Status::Synced && !opts.force {
            return SyncResult::skip(&doc.name, "already synced");
        }

        let push_target = if status.status == Status::Conflict && !opts.force {
            match self.resolve(doc, &status, strategy) {
                Ok(Some(resolved)) => resolved,
                Ok(None) => {
                    return SyncResult {
                        success: false,
                        message: format!("{}: conflict requires manual resolution", doc.name),
                        details: SyncDetails::default(),
                        errors: vec![format!("{}: unresolved sync conflict", doc.name)],
                    }
                }
                Err(err) => return SyncResult::failed(&doc.name, &err.to_string()),
            }
        } else {
            doc.clone()
        };

        if opts.dry_run {
            let verb = if status.remote_id.is_some() { "update" } else { "create" };
            return SyncResult {
                success: true,
                message: format!("{}: would {verb}", doc.name),
                details: SyncDetails { skipped: 1, ..SyncDetails::default() },
                errors: Vec::new(),
            };
        }

        let remote = match self.adapter.push(&push_target, opts) {
            Ok(r) => r,
            Err(err) => return SyncResult::failed(&doc.name, &err.to_string()),
        };

        if let Err(err) = self.write_back(&push_target, &remote) {
            return SyncResult::failed(&doc.name, &err);
        }

        let mut details = SyncDetails::default();
        if status.remote_id.is_some() {
            details.updated = 1;
        } else {
            details.created = 1;
        }
        SyncResult {
            success: true,
            message: format!("{}: synced (#{})", doc.name, remote.parent.id),
            details,
            errors: Vec::new(),
        }
    }

    fn resolve(
        &self,
        doc: &SpecDocument,
        status: &crate::adapter::SyncStatus,
        strategy: ConflictStrategy,
    ) -> Result<Option<SpecDocument>, AdapterError> {
        let Some(remote_id) = status.remote_id else {
            return Ok(Some(doc.clone()));
        };
        let remote_ref = RemoteRef { id: remote_id, url: None, kind: RemoteRefKind::Parent };
        let remote_doc = self.adapter.pull(&remote_ref)?;
        match self.adapter.resolve_conflict(doc, &remote_doc, strategy) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(AdapterError::SyncConflict(_) | AdapterError::InteractiveUnavailable) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes the resulting `sync_hash`/`last_sync`/`sync_status`/identity
    /// back into every file's front-matter and persists it through the
    /// scanner.
    ///
    /// `spec_id` is stamped onto every file the push touched (not just
    /// `spec.md`), and each file's `issue_number` comes from `outcome`'s
    /// per-file map rather than being assumed to match the parent issue.
    fn write_back(&self, doc: &SpecDocument, outcome: &PushOutcome) -> Result<(), String> {
        for (filename, file) in &doc.files {
            let Some(&issue_number) = outcome.issue_numbers.get(filename) else {
                continue;
            };
            let mut fm = file.frontmatter.clone();
            fm.spec_id = Some(outcome.spec_id);
            fm.sync_hash = Some(frontmatter::sync_hash(&file.markdown));
            fm.last_sync = Some(chrono::Utc::now());
            fm.sync_status = Some(FrontmatterSyncStatus::Synced);
            fm.github_mut().issue_number = Some(issue_number);
            let rendered = frontmatter::render(&fm, &file.markdown)
                .map_err(|e| format!("{}: {e}", file.path.display()))?;
            self.scanner
                .write_spec_file(file, &rendered)
                .map_err(|e| format!("{}: {e}", file.path.display()))?;
        }
        Ok(())
    }
}
