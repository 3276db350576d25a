//! Spec tree scanner: produces a typed view of the on-disk spec directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::frontmatter::{self, Frontmatter};
use crate::ports::FileSystem;

/// Top-level filenames the scanner recognizes by convention.
pub const RECOGNIZED_FILES: &[&str] =
    &["spec.md", "plan.md", "research.md", "data-model.md", "quickstart.md", "tasks.md"];

static ISSUE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)-").unwrap());

/// A single Markdown file inside a spec directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    /// Absolute (or root-relative) path on disk.
    pub path: PathBuf,
    /// Key under which this file is stored in `SpecDocument::files`:
    /// the bare filename for top-level files, `contracts/<name>` for
    /// contract files.
    pub filename: String,
    /// Raw file content, equal to `render(frontmatter) + markdown`.
    pub content: String,
    /// Parsed front-matter (empty if the file had none or an illegal header).
    pub frontmatter: Frontmatter,
    /// The body with front-matter stripped.
    pub markdown: String,
}

impl SpecFile {
    fn from_content(path: PathBuf, filename: String, content: String) -> Result<Self, ScanError> {
        let (frontmatter, markdown) = frontmatter::parse(&content)
            .map_err(|e| ScanError::InvalidFrontmatter { path: path.clone(), source: e })?;
        Ok(Self { path, filename, content, frontmatter, markdown })
    }
}

/// One feature directory's worth of spec files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocument {
    /// Directory basename.
    pub name: String,
    /// Directory path.
    pub path: PathBuf,
    /// Recognized and contract files, keyed by filename.
    pub files: BTreeMap<String, SpecFile>,
}

impl SpecDocument {
    /// Issue number encoded in the directory name prefix (`NNN-...`), if any.
    #[must_use]
    pub fn issue_number_from_name(&self) -> Option<u64> {
        ISSUE_PREFIX.captures(&self.name).and_then(|c| c[1].parse().ok())
    }
}

/// Errors encountered while walking the spec tree.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A recognized file's front-matter failed to parse or validate.
    #[error("{path}: invalid front-matter: {source}")]
    InvalidFrontmatter { path: PathBuf, source: frontmatter::FrontmatterError },
    /// An underlying filesystem operation failed.
    #[error("filesystem error at {path}: {source}")]
    Io { path: PathBuf, source: Box<dyn std::error::Error + Send + Sync> },
}

/// Reads and writes the on-disk spec tree through the `FileSystem` port.
pub struct Scanner<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner rooted at `root` (conventionally `specs/`).
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, root: impl Into<PathBuf>) -> Self {
        Self { fs, root: root.into() }
    }

    /// Walks every immediate subdirectory of the root and returns one
    /// `SpecDocument` per directory that contains at least one Markdown
    /// file, ordered by directory name.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed, or if any recognized
    /// file's front-matter is invalid.
    pub fn scan_all(&self) -> Result<Vec<SpecDocument>, ScanError> {
        if !self.fs.is_dir(&self.root) {
            return Ok(Vec::new());
        }
        let mut names = self
            .fs
            .list_dir(&self.root)
            .map_err(|source| ScanError::Io { path: self.root.clone(), source })?;
        names.sort();

        let mut docs = Vec::new();
        for name in names {
            if name.starts_with('.') {
                continue;
            }
            let dir = self.root.join(&name);
            if self.fs.is_symlink(&dir) || !self.fs.is_dir(&dir) {
                continue;
            }
            if let Some(doc) = self.scan_directory(&dir)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Scans a single directory into a `SpecDocument`.
    ///
    /// Returns `Ok(None)` when the directory does not exist or contains no
    /// Markdown file.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized file cannot be read or its
    /// front-matter is invalid.
    pub fn scan_directory(&self, dir: &Path) -> Result<Option<SpecDocument>, ScanError> {
        if !self.fs.is_dir(dir) {
            return Ok(None);
        }
        let name = dir.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        let mut files = BTreeMap::new();

        for filename in RECOGNIZED_FILES {
            let path = dir.join(filename);
            if self.fs.is_symlink(&path) || !self.fs.is_file(&path) {
                continue;
            }
            let content = self
                .fs
                .read_to_string(&path)
                .map_err(|source| ScanError::Io { path: path.clone(), source })?;
            let file = SpecFile::from_content(path, (*filename).to_string(), content)?;
            files.insert(file.filename.clone(), file);
        }

        let entries = self.fs.list_dir(dir).unwrap_or_default();
        for entry in entries {
            if !RECOGNIZED_FILES.contains(&entry.as_str()) && entry.ends_with(".md") {
                let path = dir.join(&entry);
                if self.fs.is_symlink(&path) || !self.fs.is_file(&path) {
                    continue;
                }
                let content = self
                    .fs
                    .read_to_string(&path)
                    .map_err(|source| ScanError::Io { path: path.clone(), source })?;
                let file = SpecFile::from_content(path, entry.clone(), content)?;
                files.insert(file.filename.clone(), file);
            }
        }

        let contracts_dir = dir.join("contracts");
        if self.fs.is_dir(&contracts_dir) && !self.fs.is_symlink(&contracts_dir) {
            let entries =
                self.fs.list_dir(&contracts_dir).map_err(|source| ScanError::Io {
                    path: contracts_dir.clone(),
                    source,
                })?;
            for entry in entries {
                let path = contracts_dir.join(&entry);
                if self.fs.is_symlink(&path) || !self.fs.is_file(&path) {
                    continue;
                }
                let content = self
                    .fs
                    .read_to_string(&path)
                    .map_err(|source| ScanError::Io { path: path.clone(), source })?;
                let key = format!("contracts/{entry}");
                let file = SpecFile::from_content(path, key.clone(), content)?;
                files.insert(key, file);
            }
        }

        if files.is_empty() {
            return Ok(None);
        }
        Ok(Some(SpecDocument { name, path: dir.to_path_buf(), files }))
    }

    /// Finds the spec document whose directory-name prefix matches `number`,
    /// preferring that over a front-matter `github.issue_number` match.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be scanned.
    pub fn find_spec_by_issue_number(
        &self,
        number: u64,
    ) -> Result<Option<SpecDocument>, ScanError> {
        let docs = self.scan_all()?;
        if let Some(doc) = docs.iter().find(|d| d.issue_number_from_name() == Some(number)) {
            return Ok(Some(doc.clone()));
        }
        Ok(docs.into_iter().find(|d| {
            d.files
                .get("spec.md")
                .and_then(|f| f.frontmatter.github.as_ref())
                .and_then(|g| g.issue_number)
                == Some(number)
        }))
    }

    /// Looks up one file within a document by its key (`"spec.md"`,
    /// `"contracts/foo.md"`, ...).
    #[must_use]
    pub fn get_spec_file<'d>(&self, doc: &'d SpecDocument, filename: &str) -> Option<&'d SpecFile> {
        doc.files.get(filename)
    }

    /// Atomically replaces a spec file's content on disk: write to a
    /// sibling temp file, then rename over the target.
    ///
    /// # Errors
    ///
    /// Returns an error if either the write or the rename fails.
    pub fn write_spec_file(
        &self,
        file: &SpecFile,
        new_content: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = file.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        let tmp_path = file.path.with_extension("md.tmp");
        self.fs.write(&tmp_path, new_content)?;
        self.fs.rename(&tmp_path, &file.path)?;
        Ok(())
    }

    /// Creates a spec directory (and parents) if it doesn't already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_spec_directory(
        &self,
        relative: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
        let dir = self.root.join(relative);
        self.fs.create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Derives a human feature name from a spec directory name: strips a
/// leading `NNN-` prefix, splits on `-`, and Title-Cases each token.
#[must_use]
pub fn get_feature_name(spec_name: &str) -> String {
    let stripped = ISSUE_PREFIX.replace(spec_name, "");
    stripped
        .split('-')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory filesystem for scanner tests.
    struct MemFs {
        files: Mutex<HashMap<PathBuf, String>>,
    }

    impl MemFs {
        fn new() -> Self {
            Self { files: Mutex::new(HashMap::new()) }
        }

        fn seed(&self, path: &str, content: &str) {
            self.files.lock().unwrap().insert(PathBuf::from(path), content.to_string());
        }
    }

    impl FileSystem for MemFs {
        fn read_to_string(
            &self,
            path: &Path,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| format!("not found: {}", path.display()).into())
        }

        fn write(
            &self,
            path: &Path,
            contents: &str,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.is_dir(path) || self.is_file(path)
        }

        fn list_dir(
            &self,
            path: &Path,
        ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
            let files = self.files.lock().unwrap();
            let mut names: Vec<String> = Vec::new();
            let mut seen = std::collections::HashSet::new();
            for k in files.keys() {
                if let Ok(rel) = k.strip_prefix(path) {
                    if let Some(first) = rel.components().next() {
                        let s = first.as_os_str().to_string_lossy().into_owned();
                        if seen.insert(s.clone()) {
                            names.push(s);
                        }
                    }
                }
            }
            names.sort();
            Ok(names)
        }

        fn is_dir(&self, path: &Path) -> bool {
            let files = self.files.lock().unwrap();
            files.keys().any(|k| k.starts_with(path) && k != path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn is_symlink(&self, _path: &Path) -> bool {
            false
        }

        fn create_dir_all(&self, _path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }

        fn rename(
            &self,
            from: &Path,
            to: &Path,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let mut files = self.files.lock().unwrap();
            let content = files.remove(from).ok_or_else(|| format!("rename source missing: {}", from.display()))?;
            files.insert(to.to_path_buf(), content);
            Ok(())
        }
    }

    #[test]
    fn scan_all_finds_one_document_per_directory() {
        let fs = MemFs::new();
        fs.seed("specs/001-login/spec.md", "# Login\n");
        fs.seed("specs/002-signup/spec.md", "# Signup\n");
        fs.seed("specs/.hidden/spec.md", "# Hidden\n");

        let scanner = Scanner::new(&fs, "specs");
        let docs = scanner.scan_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "001-login");
        assert_eq!(docs[1].name, "002-signup");
    }

    #[test]
    fn scan_directory_includes_contracts_one_level_deep() {
        let fs = MemFs::new();
        fs.seed("specs/001-login/spec.md", "# Login\n");
        fs.seed("specs/001-login/contracts/api.yaml", "openapi: 3.0\n");

        let scanner = Scanner::new(&fs, "specs");
        let doc = scanner.scan_directory(Path::new("specs/001-login")).unwrap().unwrap();
        assert!(doc.files.contains_key("spec.md"));
        assert!(doc.files.contains_key("contracts/api.yaml"));
    }

    #[test]
    fn scan_directory_returns_none_when_no_markdown_present() {
        let fs = MemFs::new();
        let scanner = Scanner::new(&fs, "specs");
        let doc = scanner.scan_directory(Path::new("specs/missing")).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn issue_number_from_directory_prefix() {
        let fs = MemFs::new();
        fs.seed("specs/042-widgets/spec.md", "# Widgets\n");
        let scanner = Scanner::new(&fs, "specs");
        let doc = scanner.find_spec_by_issue_number(42).unwrap().unwrap();
        assert_eq!(doc.name, "042-widgets");
    }

    #[test]
    fn directory_prefix_match_wins_over_frontmatter_match() {
        let fs = MemFs::new();
        fs.seed(
            "specs/007-other/spec.md",
            "---\ngithub:\n  issue_number: 42\n---\n# Other\n",
        );
        fs.seed("specs/042-widgets/spec.md", "# Widgets\n");

        let scanner = Scanner::new(&fs, "specs");
        let doc = scanner.find_spec_by_issue_number(42).unwrap().unwrap();
        assert_eq!(doc.name, "042-widgets");
    }

    #[test]
    fn write_spec_file_round_trips_through_temp_rename() {
        let fs = MemFs::new();
        fs.seed("specs/001-login/spec.md", "# Login\n");
        let scanner = Scanner::new(&fs, "specs");
        let doc = scanner.scan_directory(Path::new("specs/001-login")).unwrap().unwrap();
        let file = doc.files.get("spec.md").unwrap();

        scanner.write_spec_file(file, "# Login v2\n").unwrap();
        let content = fs.read_to_string(Path::new("specs/001-login/spec.md")).unwrap();
        assert_eq!(content, "# Login v2\n");
    }

    #[test]
    fn feature_name_strips_prefix_and_title_cases() {
        assert_eq!(get_feature_name("042-user-profile-page"), "User Profile Page");
        assert_eq!(get_feature_name("login"), "Login");
    }
}
