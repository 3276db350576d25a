//! Reference tracker adapter driving a GitHub-style issue tracker through
//! an external command-line tool (default `gh`).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::adapter::{
    Adapter, AdapterCapabilities, AdapterError, ConflictStrategy, Issue, IssueState, PushOutcome,
    RemoteRef, RemoteRefKind, Status, SyncStatus,
};
use crate::frontmatter::{self, Frontmatter};
use crate::mapper;
use crate::ports::id_gen::IdGenerator;
use crate::ports::tracker_cli::TrackerCli;
use crate::scanner::{SpecDocument, SpecFile};

const LABEL_CACHE_LIMIT: usize = 1000;
const MAX_CONCURRENT_CREATES: usize = 5;

/// Per-file-kind label configuration, as read from `SyncConfig`.
#[derive(Debug, Clone, Default)]
pub struct LabelConfig {
    /// Labels applied to every pushed file, prepended to the per-kind set.
    pub common: Vec<String>,
    /// Labels applied per recognized file kind (`"spec"`, `"plan"`, ...).
    pub by_kind: HashMap<String, Vec<String>>,
}

impl LabelConfig {
    /// Computes the effective, deduplicated label set for a file kind.
    ///
    /// Falls back to `[kind]` when no explicit mapping exists for it.
    #[must_use]
    pub fn effective(&self, kind: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for label in self.common.iter().chain(self.by_kind.get(kind).into_iter().flatten()) {
            if seen.insert(label.clone()) {
                out.push(label.clone());
            }
        }
        if out.is_empty() && !self.by_kind.contains_key(kind) {
            out.push(kind.to_string());
        }
        out
    }
}

fn label_color(label: &str) -> &'static str {
    match label {
        "spec" => "0366d6",
        "plan" => "6f42c1",
        "research" => "1d76db",
        "task" => "fbca04",
        "quickstart" => "0e8a16",
        "datamodel" => "d93f0b",
        "contracts" => "b60205",
        "subtask" => "5319e7",
        "common" => "c5def5",
        _ => "c5def5",
    }
}

/// Derives the file-kind key used for label lookups from a spec file key.
fn file_kind(filename: &str) -> &str {
    match filename {
        "spec.md" => "spec",
        "plan.md" => "plan",
        "research.md" => "research",
        "tasks.md" => "task",
        "quickstart.md" => "quickstart",
        "data-model.md" => "datamodel",
        f if f.starts_with("contracts/") => "contracts",
        _ => "subtask",
    }
}

/// GitHub-style reference adapter. Talks to the tracker exclusively through
/// the `TrackerCli` port; never builds a shell string.
pub struct GithubAdapter<'a> {
    cli: &'a dyn TrackerCli,
    id_gen: &'a dyn IdGenerator,
    owner: String,
    repo: String,
    labels: LabelConfig,
    label_cache: Mutex<HashSet<String>>,
}

impl<'a> GithubAdapter<'a> {
    /// Creates a new adapter for `owner/repo`, invoking the tracker through
    /// `cli` and minting new `spec_id`s (when a spec has none yet) through
    /// `id_gen`.
    #[must_use]
    pub fn new(
        cli: &'a dyn TrackerCli,
        id_gen: &'a dyn IdGenerator,
        owner: String,
        repo: String,
        labels: LabelConfig,
    ) -> Self {
        Self { cli, id_gen, owner, repo, labels, label_cache: Mutex::new(HashSet::new()) }
    }

    /// Returns the spec's existing `spec_id`, or mints a fresh one.
    fn ensure_spec_id(&self, fm: &Frontmatter) -> Result<Uuid, AdapterError> {
        match fm.spec_id {
            Some(id) => Ok(id),
            None => self
                .id_gen
                .generate_id()
                .parse()
                .map_err(|e: uuid::Error| AdapterError::Other(Box::new(e))),
        }
    }

    fn repo_arg(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn invoke(
        &self,
        args: &[&str],
        body: Option<&str>,
    ) -> Result<crate::ports::tracker_cli::CliOutput, AdapterError> {
        let owned: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
        self.cli.invoke(&owned, body).map_err(AdapterError::Other)
    }

    fn remember_label(&self, label: &str) {
        let mut cache = self.label_cache.lock().expect("label cache poisoned");
        if cache.len() >= LABEL_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(label.to_string());
    }

    fn label_known(&self, label: &str) -> bool {
        self.label_cache.lock().expect("label cache poisoned").iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    /// Ensures every label in `wanted` exists on the remote repository,
    /// creating any that are missing. Creation failures other than
    /// "already exists" are logged and skipped — label provisioning never
    /// fails a push.
    fn ensure_labels(&self, wanted: &[String]) {
        let missing: Vec<&String> = wanted.iter().filter(|l| !self.label_known(l)).collect();
        if missing.is_empty() {
            return;
        }

        let list_args = ["label", "list", "--repo", &self.repo_arg(), "--json", "name"];
        if let Ok(out) = self.invoke(&list_args, None) {
            if out.success() {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&out.stdout) {
                    for item in items {
                        if let Some(name) = item.get("name").and_then(Value::as_str) {
                            self.remember_label(name);
                        }
                    }
                }
            }
        }

        for label in missing {
            if self.label_known(label) {
                continue;
            }
            let color = label_color(label);
            let repo_arg = self.repo_arg();
            let args =
                ["label", "create", label.as_str(), "--repo", repo_arg.as_str(), "--color", color];
            match self.invoke(&args, None) {
                Ok(out) if out.success() || out.stderr.to_lowercase().contains("already exists") => {
                    self.remember_label(label);
                }
                Ok(out) => {
                    tracing::warn!(label = %label, stderr = %out.stderr, "label creation failed");
                }
                Err(err) => {
                    tracing::warn!(label = %label, error = %err, "label creation failed");
                }
            }
        }
    }

    /// Searches for an open or closed issue whose body embeds `spec_id`.
    fn find_by_marker(&self, spec_id: Uuid) -> Result<Option<Issue>, AdapterError> {
        let marker = mapper::marker_line(spec_id);
        let search = format!("\"{marker}\" in:body");
        let repo_arg = self.repo_arg();
        let json_fields = "number,title,body,state,labels,assignees,milestone,updatedAt";
        let args = [
            "issue",
            "list",
            "--repo",
            repo_arg.as_str(),
            "--search",
            search.as_str(),
            "--state",
            "all",
            "--json",
            json_fields,
        ];
        let out = self.invoke(&args, None)?;
        if !out.success() {
            return Err(AdapterError::RemoteUnavailable(out.stderr));
        }
        let items: Vec<Value> = serde_json::from_str(&out.stdout)
            .map_err(|e| AdapterError::RemoteUnavailable(format!("malformed issue list: {e}")))?;
        let matches: Vec<Issue> =
            items.iter().filter_map(parse_issue_json).filter(|i| mapper::extract_marker(&i.body) == Some(spec_id)).collect();
        Ok(matches.into_iter().next())
    }

    fn fetch_issue(&self, number: u64) -> Result<Option<Issue>, AdapterError> {
        let repo_arg = self.repo_arg();
        let number_arg = number.to_string();
        let json_fields = "number,title,body,state,labels,assignees,milestone,updatedAt";
        let args = [
            "issue",
            "view",
            number_arg.as_str(),
            "--repo",
            repo_arg.as_str(),
            "--json",
            json_fields,
        ];
        let out = self.invoke(&args, None)?;
        if !out.success() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&out.stdout)
            .map_err(|e| AdapterError::RemoteUnavailable(format!("malformed issue view: {e}")))?;
        Ok(parse_issue_json(&value))
    }

    /// Resolves the push target for one spec's `spec.md`, per the identity
    /// resolution algorithm: marker search first, then issue-number
    /// fallback with mismatch detection.
    fn resolve_identity(
        &self,
        fm: &Frontmatter,
        opts: &crate::adapter::PushOptions,
    ) -> Result<Option<Issue>, AdapterError> {
        if let Some(spec_id) = fm.spec_id {
            if let Some(issue) = self.find_by_marker(spec_id)? {
                return Ok(Some(issue));
            }
        }
        if let Some(number) = fm.github.as_ref().and_then(|g| g.issue_number) {
            if let Some(issue) = self.fetch_issue(number)? {
                let remote_marker = mapper::extract_marker(&issue.body);
                match (fm.spec_id, remote_marker) {
                    (Some(local), Some(remote)) if local != remote => {
                        if opts.force {
                            return Ok(None);
                        }
                        return Err(AdapterError::UuidMismatch { local, remote });
                    }
                    _ => return Ok(Some(issue)),
                }
            }
        }
        Ok(None)
    }

    fn push_one_file(
        &self,
        spec: &SpecDocument,
        filename: &str,
        file: &SpecFile,
        existing: Option<&Issue>,
        parent_number: Option<u64>,
        spec_id: Option<Uuid>,
    ) -> Result<u64, AdapterError> {
        let kind = file_kind(filename);
        let labels = self.labels.effective(kind);
        self.ensure_labels(&labels);

        let title = mapper::generate_title(&spec.name, filename);
        let body = mapper::generate_body(file, &spec.name, &spec.path.display().to_string(), spec_id);
        let repo_arg = self.repo_arg();

        match existing {
            Some(issue) => {
                let number_arg = issue.number.to_string();
                let mut args =
                    vec!["issue", "edit", number_arg.as_str(), "--repo", repo_arg.as_str()];
                let mut label_args = Vec::new();
                for label in &labels {
                    if !issue.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
                        label_args.push("--add-label".to_string());
                        label_args.push(label.clone());
                    }
                }
                let label_refs: Vec<&str> = label_args.iter().map(String::as_str).collect();
                args.extend(label_refs);
                args.push("--title");
                args.push(title.as_str());
                let out = self.invoke(&args, Some(&body))?;
                if !out.success() {
                    return Err(AdapterError::RemoteUnavailable(out.stderr));
                }
                Ok(issue.number)
            }
            None => {
                let label_csv = labels.join(",");
                let mut args =
                    vec!["issue", "create", "--repo", repo_arg.as_str(), "--title", title.as_str()];
                if !label_csv.is_empty() {
                    args.push("--label");
                    args.push(label_csv.as_str());
                }
                let out = self.invoke(&args, Some(&body))?;
                if !out.success() {
                    return Err(AdapterError::RemoteUnavailable(out.stderr));
                }
                let number = parse_issue_number_from_url(out.stdout.trim())
                    .ok_or_else(|| AdapterError::RemoteUnavailable(format!("could not parse issue number from: {}", out.stdout)))?;

                if let Some(parent) = parent_number {
                    let number_arg = number.to_string();
                    let parent_arg = parent.to_string();
                    let link_args = [
                        "sub-issue",
                        "add",
                        parent_arg.as_str(),
                        number_arg.as_str(),
                        "--repo",
                        repo_arg.as_str(),
                    ];
                    if let Ok(link_out) = self.invoke(&link_args, None) {
                        if !link_out.success() {
                            tracing::warn!(parent, number, "subtask linking unavailable");
                        }
                    }
                }
                Ok(number)
            }
        }
    }
}

fn parse_issue_number_from_url(output: &str) -> Option<u64> {
    output.rsplit('/').next().and_then(|tail| tail.parse().ok())
}

fn parse_issue_json(value: &Value) -> Option<Issue> {
    let number = value.get("number")?.as_u64()?;
    let title = value.get("title")?.as_str()?.to_string();
    let body = value.get("body").and_then(Value::as_str).unwrap_or_default().to_string();
    let state = match value.get("state").and_then(Value::as_str) {
        Some("CLOSED" | "closed") => IssueState::Closed,
        _ => IssueState::Open,
    };
    let labels = value
        .get("labels")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|l| l.get("name").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let assignees = value
        .get("assignees")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|a| a.get("login").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let milestone = value.get("milestone").and_then(|m| m.get("number")).and_then(Value::as_u64);
    let updated_at = value
        .get("updatedAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(Issue { number, title, body, state, labels, assignees, milestone, parent_issue: None, updated_at })
}

impl Adapter for GithubAdapter<'_> {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            supports_batch: true,
            supports_subtasks: true,
            supports_labels: true,
            supports_assignees: true,
            supports_milestones: true,
            supports_comments: true,
            supports_conflict_resolution: true,
        }
    }

    fn check_auth(&self) -> bool {
        self.invoke(&["auth", "status"], None).map(|out| out.success()).unwrap_or(false)
    }

    fn push(&self, spec: &SpecDocument, opts: &crate::adapter::PushOptions) -> Result<PushOutcome, AdapterError> {
        let spec_file = spec
            .files
            .get("spec.md")
            .ok_or_else(|| AdapterError::ValidationFailed(format!("{}: missing spec.md", spec.name)))?;

        let existing = self.resolve_identity(&spec_file.frontmatter, opts)?;
        let spec_id = self.ensure_spec_id(&spec_file.frontmatter)?;
        let parent_number =
            self.push_one_file(spec, "spec.md", spec_file, existing.as_ref(), None, Some(spec_id))?;

        let mut issue_numbers = BTreeMap::new();
        issue_numbers.insert("spec.md".to_string(), parent_number);

        for (filename, file) in spec.files.iter().filter(|(k, _)| k.as_str() != "spec.md") {
            if !file.frontmatter.auto_sync_enabled() {
                continue;
            }
            let existing_sub = file
                .frontmatter
                .github
                .as_ref()
                .and_then(|g| g.issue_number)
                .map(|n| self.fetch_issue(n))
                .transpose()?
                .flatten();
            let number = self.push_one_file(
                spec,
                filename,
                file,
                existing_sub.as_ref(),
                Some(parent_number),
                file.frontmatter.spec_id,
            )?;
            issue_numbers.insert(filename.clone(), number);
        }

        Ok(PushOutcome {
            parent: RemoteRef { id: parent_number, url: None, kind: RemoteRefKind::Parent },
            spec_id,
            issue_numbers,
        })
    }

    fn push_batch(
        &self,
        specs: &[SpecDocument],
        opts: &crate::adapter::PushOptions,
    ) -> Vec<Result<PushOutcome, AdapterError>> {
        // Provision the union of all labels once, up front.
        let mut all_labels = Vec::new();
        let mut seen = HashSet::new();
        for spec in specs {
            for filename in spec.files.keys() {
                for label in self.labels.effective(file_kind(filename)) {
                    if seen.insert(label.clone()) {
                        all_labels.push(label);
                    }
                }
            }
        }
        self.ensure_labels(&all_labels);

        let mut results: Vec<Option<Result<PushOutcome, AdapterError>>> = specs.iter().map(|_| None).collect();
        for chunk in (0..specs.len()).collect::<Vec<_>>().chunks(MAX_CONCURRENT_CREATES) {
            std::thread::scope(|scope| {
                let mut handles = Vec::new();
                for &idx in chunk {
                    let spec = &specs[idx];
                    handles.push((idx, scope.spawn(move || self.push(spec, opts))));
                }
                for (idx, handle) in handles {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(AdapterError::RemoteUnavailable("push thread panicked".to_string()))
                    });
                    results[idx] = Some(outcome);
                }
            });
        }
        results.into_iter().map(|r| r.expect("every index filled by the chunk loop")).collect()
    }

    fn pull(&self, remote: &RemoteRef) -> Result<SpecDocument, AdapterError> {
        let issue = self
            .fetch_issue(remote.id)?
            .ok_or_else(|| AdapterError::RemoteUnavailable(format!("issue #{} not found", remote.id)))?;

        let (spec_name, fm, markdown) = mapper::issue_to_spec_file(&issue.title, &issue.body, issue.number);
        let content = frontmatter::render(&fm, &markdown)
            .map_err(|e| AdapterError::ValidationFailed(e.to_string()))?;
        let path = std::path::PathBuf::from(&spec_name).join("spec.md");

        let mut files = BTreeMap::new();
        files.insert(
            "spec.md".to_string(),
            SpecFile { path: path.clone(), filename: "spec.md".to_string(), content, frontmatter: fm, markdown },
        );
        Ok(SpecDocument { name: spec_name, path: path.parent().unwrap_or(&path).to_path_buf(), files })
    }

    fn get_status(&self, spec: &SpecDocument) -> Result<SyncStatus, AdapterError> {
        let Some(spec_file) = spec.files.get("spec.md") else {
            return Ok(SyncStatus {
                status: Status::Unknown,
                has_changes: false,
                remote_id: None,
                last_sync: None,
                conflicts: vec!["spec.md missing".to_string()],
            });
        };
        let fm = &spec_file.frontmatter;
        let current_hash = frontmatter::sync_hash(&spec_file.markdown);
        let has_changes = fm.sync_hash.as_deref() != Some(current_hash.as_str());

        if fm.spec_id.is_none() && fm.github.as_ref().and_then(|g| g.issue_number).is_none() {
            return Ok(SyncStatus {
                status: Status::Local,
                has_changes,
                remote_id: None,
                last_sync: None,
                conflicts: Vec::new(),
            });
        }

        let existing = match self.resolve_identity(fm, &crate::adapter::PushOptions::default()) {
            Ok(issue) => issue,
            Err(AdapterError::UuidMismatch { local, remote }) => {
                return Ok(SyncStatus {
                    status: Status::Conflict,
                    has_changes,
                    remote_id: fm.github.as_ref().and_then(|g| g.issue_number),
                    last_sync: fm.last_sync,
                    conflicts: vec![format!("spec_id mismatch: local={local} remote={remote}")],
                });
            }
            Err(err) => return Err(err),
        };

        let Some(issue) = existing else {
            return Ok(SyncStatus {
                status: Status::Draft,
                has_changes,
                remote_id: None,
                last_sync: fm.last_sync,
                conflicts: Vec::new(),
            });
        };

        let remote_newer = fm.last_sync.is_none_or(|last| issue.updated_at > last);
        let status = if remote_newer && has_changes {
            Status::Conflict
        } else if !has_changes && !remote_newer {
            Status::Synced
        } else {
            Status::Draft
        };
        let conflicts = if status == Status::Conflict {
            vec!["both local and remote changed since the last sync".to_string()]
        } else {
            Vec::new()
        };

        Ok(SyncStatus {
            status,
            has_changes,
            remote_id: Some(issue.number),
            last_sync: fm.last_sync,
            conflicts,
        })
    }

    fn resolve_conflict(
        &self,
        local: &SpecDocument,
        remote: &SpecDocument,
        strategy: ConflictStrategy,
    ) -> Result<SpecDocument, AdapterError> {
        match strategy {
            ConflictStrategy::Manual => {
                Err(AdapterError::SyncConflict(vec!["manual resolution required".to_string()]))
            }
            ConflictStrategy::Interactive => Err(AdapterError::InteractiveUnavailable),
            ConflictStrategy::Ours => Ok(local.clone()),
            ConflictStrategy::Theirs => {
                let mut merged = local.clone();
                for (key, remote_file) in &remote.files {
                    merged.files.insert(key.clone(), remote_file.clone());
                }
                Ok(merged)
            }
        }
    }
}
