//! Maps between spec files and the tracker-neutral `Issue` representation.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::frontmatter::{Frontmatter, SyncStatus};
use crate::scanner::{get_feature_name, SpecFile};

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*spec_id:\s*([0-9a-fA-F-]{36})\s*-->").unwrap());

/// Returns the title prefix used for a given file kind.
#[must_use]
pub fn title_prefix(file_kind: &str) -> &'static str {
    match file_kind {
        "spec.md" => "Feature Specification:",
        "plan.md" => "Plan:",
        "research.md" => "Research:",
        "quickstart.md" => "Quickstart:",
        "data-model.md" => "Data Model:",
        "tasks.md" => "Tasks:",
        k if k.starts_with("contracts/") => "API Contracts:",
        _ => "Spec:",
    }
}

/// Generates the remote issue title for a spec file.
#[must_use]
pub fn generate_title(spec_name: &str, file_kind: &str) -> String {
    format!("{} {}", title_prefix(file_kind), get_feature_name(spec_name))
}

/// Generates the remote issue body for a spec file.
///
/// Strips the front-matter (already done via `file.markdown`), appends a
/// footer identifying the source spec, and prepends the UUID marker when
/// `spec_id` is given. The caller supplies `spec_id` explicitly (rather
/// than this function reading `file.frontmatter.spec_id`) so it can embed
/// a freshly minted identity before that identity has been written back
/// to disk.
#[must_use]
pub fn generate_body(file: &SpecFile, spec_name: &str, spec_path: &str, spec_id: Option<Uuid>) -> String {
    let footer = format!(
        "---\n**Spec:** `{spec_name}`\n**Path:** `{spec_path}`\n**Synced:** {}\n",
        Utc::now().to_rfc3339()
    );
    let body = format!("{}\n{footer}", file.markdown.trim_end());

    match spec_id {
        Some(id) => format!("{}\n{body}", marker_line(id)),
        None => body,
    }
}

/// Returns the literal UUID marker line for a given spec id.
#[must_use]
pub fn marker_line(spec_id: Uuid) -> String {
    format!("<!-- spec_id: {} -->", spec_id.hyphenated())
}

/// Extracts the first embedded UUID marker from an issue body, if any.
#[must_use]
pub fn extract_marker(body: &str) -> Option<Uuid> {
    MARKER_RE.captures(body).and_then(|c| c[1].parse().ok())
}

/// Derives a spec directory name from a remote issue title: strips a
/// recognized prefix, lowercases, replaces whitespace runs with `-`, and
/// drops characters outside `[a-z0-9-]`.
#[must_use]
pub fn spec_name_from_title(title: &str) -> String {
    let prefixes = [
        "Feature Specification:",
        "Plan:",
        "Research:",
        "Quickstart:",
        "Data Model:",
        "Tasks:",
        "API Contracts:",
    ];
    let mut stripped = title.trim();
    for prefix in prefixes {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            stripped = rest.trim();
            break;
        }
    }
    let lowered = stripped.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    collapsed.chars().filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-').collect()
}

/// Projects a remote issue's title/body into a freshly synced single-file
/// spec: front-matter marked `synced`, body with the marker and footer
/// stripped.
#[must_use]
pub fn issue_to_spec_file(title: &str, body: &str, issue_number: u64) -> (String, Frontmatter, String) {
    let spec_name = spec_name_from_title(title);
    let spec_id = extract_marker(body);

    let without_marker = MARKER_RE.replace(body, "").trim_start().to_string();
    let markdown = match without_marker.find("\n---\n**Spec:**") {
        Some(idx) => without_marker[..idx].trim_end().to_string() + "\n",
        None => without_marker,
    };

    let mut fm = Frontmatter {
        spec_id,
        sync_status: Some(SyncStatus::Synced),
        last_sync: Some(Utc::now()),
        sync_hash: Some(crate::frontmatter::sync_hash(&markdown)),
        ..Frontmatter::default()
    };
    fm.github_mut().issue_number = Some(issue_number);

    (spec_name, fm, markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_title_uses_kind_prefix_and_feature_name() {
        assert_eq!(
            generate_title("042-user-profile", "spec.md"),
            "Feature Specification: User Profile"
        );
        assert_eq!(generate_title("042-user-profile", "plan.md"), "Plan: User Profile");
        assert_eq!(
            generate_title("042-user-profile", "contracts/api.yaml"),
            "API Contracts: User Profile"
        );
    }

    #[test]
    fn generate_body_embeds_marker_only_when_spec_id_given() {
        let file = SpecFile {
            path: std::path::PathBuf::from("specs/001-demo/spec.md"),
            filename: "spec.md".to_string(),
            content: String::new(),
            frontmatter: Frontmatter::default(),
            markdown: "# Demo\n".to_string(),
        };
        let without_id = generate_body(&file, "001-demo", "specs/001-demo", None);
        assert!(!without_id.contains("spec_id:"));

        let id = Uuid::new_v4();
        let with_id = generate_body(&file, "001-demo", "specs/001-demo", Some(id));
        assert_eq!(extract_marker(&with_id), Some(id));
    }

    #[test]
    fn marker_round_trips_through_body() {
        let id = Uuid::new_v4();
        let body = format!("{}\nSome body text.\n", marker_line(id));
        assert_eq!(extract_marker(&body), Some(id));
    }

    #[test]
    fn extract_marker_returns_none_when_absent() {
        assert_eq!(extract_marker("no marker here"), None);
    }

    #[test]
    fn spec_name_from_title_normalizes() {
        assert_eq!(
            spec_name_from_title("Feature Specification: User Profile Page!"),
            "user-profile-page"
        );
    }

    #[test]
    fn issue_to_spec_file_strips_marker_and_footer() {
        let id = Uuid::new_v4();
        let body = format!(
            "{}\n# User Profile\n\nDetails here.\n---\n**Spec:** `042-user-profile`\n**Path:** `specs/042-user-profile`\n**Synced:** 2024-01-01T00:00:00Z\n",
            marker_line(id)
        );
        let (name, fm, markdown) =
            issue_to_spec_file("Feature Specification: User Profile", &body, 42);
        assert_eq!(name, "user-profile");
        assert_eq!(fm.spec_id, Some(id));
        assert_eq!(fm.github.unwrap().issue_number, Some(42));
        assert!(markdown.contains("Details here."));
        assert!(!markdown.contains("**Spec:**"));
        assert!(!markdown.contains("spec_id"));
    }
}
