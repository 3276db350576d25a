//! Typed YAML front-matter schema for spec files.
//!
//! A spec file on disk is a YAML front-matter block delimited by `---`
//! lines followed by a Markdown body. This module owns the schema, the
//! parse/render round-trip, and the content-hash identity primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const DELIMITER: &str = "---";

/// Sync state of a spec file relative to the remote tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Never pushed, or identity could not be resolved to a remote issue.
    Draft,
    /// Local content hash matches `sync_hash` and the remote is not newer.
    Synced,
    /// Both local and remote changed since the last sync.
    Conflict,
}

/// Whether a spec file maps to a parent issue or a linked subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Maps to the tracker's top-level issue (always `spec.md`).
    Parent,
    /// Maps to an issue linked under a parent (every other recognized file).
    Subtask,
}

/// Tracker-specific identity and metadata, currently modeled for the
/// reference GitHub-style adapter. Other trackers would add sibling
/// blocks (`jira`, `asana`) following the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubBlock {
    /// Remote issue number once created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    /// Parent issue number, for subtask files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_issue: Option<u64>,
    /// Remote `updated_at` timestamp, as last observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Labels applied on the remote issue.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Assignees applied on the remote issue.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    /// Milestone number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Any tracker-block keys this schema doesn't model, preserved
    /// verbatim so a write-back never drops them.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// Typed YAML front-matter for one spec file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Stable identity, minted once on first successful push. Never changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<Uuid>,
    /// First 12 hex characters of SHA-256 over the markdown body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_hash: Option<String>,
    /// When this file was last successfully synced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    /// Current sync state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
    /// Whether this file participates in automatic sync. Defaults to `true`
    /// when absent (see `auto_sync_enabled`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_sync: Option<bool>,
    /// Parent or subtask.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    /// GitHub-specific tracker block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubBlock>,
}

impl Frontmatter {
    /// Returns whether this file should participate in auto-sync, treating
    /// an absent value as `true`.
    #[must_use]
    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync.unwrap_or(true)
    }

    /// Returns the `github` block, inserting an empty one if absent.
    pub fn github_mut(&mut self) -> &mut GithubBlock {
        self.github.get_or_insert_with(GithubBlock::default)
    }
}

/// Computes the 12-hex-character sync hash of a markdown body.
#[must_use]
pub fn sync_hash(markdown: &str) -> String {
    let digest = Sha256::digest(markdown.as_bytes());
    let hex = hex::encode(digest);
    hex[..12].to_string()
}

/// A file whose front-matter failed schema validation.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    /// The front-matter YAML could not be parsed at all.
    #[error("invalid front-matter YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    /// `sync_hash` was present but not 12 lowercase hex characters.
    #[error("sync_hash {0:?} is not 12 lowercase hex characters")]
    InvalidSyncHash(String),
}

/// Parses a spec file's raw content into front-matter and markdown body.
///
/// If the content does not begin with the `---` delimiter, the entire
/// content is treated as the markdown body with empty front-matter (per
/// the scanner's parsing rule — an illegal/missing header is not an
/// error, just an empty one).
///
/// # Errors
///
/// Returns an error if a `---`-delimited header is present but is not
/// valid YAML, or fails schema validation (e.g. malformed `sync_hash`).
pub fn parse(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };
    let Some(rest) = rest.strip_prefix('\n') else {
        return Ok((Frontmatter::default(), content.to_string()));
    };
    let Some(end) = rest.find("\n---") else {
        return Ok((Frontmatter::default(), content.to_string()));
    };
    let header = &rest[..end];
    let after_delim = &rest[end + 4..];
    let body = after_delim.strip_prefix('\n').unwrap_or(after_delim);

    let fm: Frontmatter = serde_yaml::from_str(header)?;
    if let Some(hash) = &fm.sync_hash {
        let valid = hash.len() == 12 && hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        if !valid {
            return Err(FrontmatterError::InvalidSyncHash(hash.clone()));
        }
    }
    Ok((fm, body.to_string()))
}

/// Renders front-matter and a markdown body back into a spec file's content.
///
/// # Errors
///
/// Returns an error if the front-matter cannot be serialized to YAML.
pub fn render(fm: &Frontmatter, markdown: &str) -> Result<String, serde_yaml::Error> {
    if fm == &Frontmatter::default() {
        return Ok(markdown.to_string());
    }
    let yaml = serde_yaml::to_string(fm)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{markdown}"))
}
