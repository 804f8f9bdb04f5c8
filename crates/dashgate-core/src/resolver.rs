//! Path allowlisting for task cards and documents.
//!
//! Two closed enumerations decide what can be read: the task folders under
//! the tasks root, and a fixed table of document keys. Every check runs
//! before the filesystem is consulted, and a task path that canonicalizes
//! outside the tasks root (for example through a symlink) is refused.
//!
//! The resolver never reads file contents. It hands back the physical path
//! plus the names the caller needs for its response envelope.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ResolveError;

/// Substring that marks a directory-escape attempt.
pub const TRAVERSAL_TOKEN: &str = "..";

/// Document keys served by default, relative to the documents root.
pub const DEFAULT_DOCUMENT_KEYS: &[&str] = &[
    "youtube-books/CURRENT_SYSTEM_SUMMARY.md",
    "shorts/docs/book_recommendation_proposal.md",
    "shorts/DEPLOY.md",
    "knowledge/youtube.md",
    "knowledge/infra.md",
];

/// Folders a task card may live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFolder {
    Active,
    Next,
    Waiting,
    Completed,
}

impl TaskFolder {
    pub const ALL: [Self; 4] = [Self::Active, Self::Next, Self::Waiting, Self::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Next => "next",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFolder {
    type Err = ResolveError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|folder| folder.as_str() == s)
            .ok_or_else(|| ResolveError::InvalidFolder {
                folder: s.to_owned(),
            })
    }
}

/// Fixed mapping from logical document key to physical path.
#[derive(Debug, Clone, Default)]
pub struct DocumentAllowlist {
    entries: BTreeMap<String, PathBuf>,
}

impl DocumentAllowlist {
    /// The default document table rooted at `docs_root`.
    #[must_use]
    pub fn with_defaults(docs_root: &Path) -> Self {
        DEFAULT_DOCUMENT_KEYS
            .iter()
            .map(|key| ((*key).to_owned(), docs_root.join(key)))
            .collect()
    }

    /// Look up a key verbatim. No normalization, no path joining.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PathBuf)> for DocumentAllowlist {
    fn from_iter<T: IntoIterator<Item = (String, PathBuf)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A task card that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    pub folder: TaskFolder,
    pub filename: String,
    pub path: PathBuf,
}

/// A document that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDoc {
    /// The logical key as requested.
    pub key: String,
    /// Final component of the physical path.
    pub filename: String,
    pub path: PathBuf,
}

/// Maps logical resources to files, enforcing both allowlists.
#[derive(Debug, Clone)]
pub struct PathResolver {
    tasks_root: PathBuf,
    documents: DocumentAllowlist,
}

impl PathResolver {
    #[must_use]
    pub fn new(tasks_root: impl Into<PathBuf>, documents: DocumentAllowlist) -> Self {
        Self {
            tasks_root: tasks_root.into(),
            documents,
        }
    }

    #[must_use]
    pub fn tasks_root(&self) -> &Path {
        &self.tasks_root
    }

    #[must_use]
    pub fn documents(&self) -> &DocumentAllowlist {
        &self.documents
    }

    /// Resolve `tasks_root/folder/filename`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidPath`] for traversal tokens, a filename that
    ///   is not a single plain component, or a path that escapes the root.
    /// - [`ResolveError::InvalidFolder`] if `folder` is not allowlisted.
    /// - [`ResolveError::NotFound`] if the file does not exist.
    /// - [`ResolveError::Io`] if the file cannot be inspected.
    pub fn resolve_task(&self, folder: &str, filename: &str) -> Result<ResolvedTask, ResolveError> {
        reject_traversal(folder)?;
        reject_traversal(filename)?;
        let folder: TaskFolder = folder.parse()?;
        require_single_component(filename)?;

        let path = self.tasks_root.join(folder.as_str()).join(filename);
        require_file(&path)?;
        require_within(&path, &self.tasks_root)?;

        Ok(ResolvedTask {
            folder,
            filename: filename.to_owned(),
            path,
        })
    }

    /// Resolve a document key through the allowlist.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidPath`] for traversal tokens.
    /// - [`ResolveError::NotAllowed`] if the key is not in the table.
    /// - [`ResolveError::NotFound`] if the mapped file does not exist.
    /// - [`ResolveError::Io`] if the file cannot be inspected.
    pub fn resolve_doc(&self, key: &str) -> Result<ResolvedDoc, ResolveError> {
        reject_traversal(key)?;

        let path = self
            .documents
            .get(key)
            .ok_or_else(|| ResolveError::NotAllowed { key: key.to_owned() })?;
        require_file(path)?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ResolvedDoc {
            key: key.to_owned(),
            filename,
            path: path.to_path_buf(),
        })
    }
}

fn reject_traversal(segment: &str) -> Result<(), ResolveError> {
    if segment.contains(TRAVERSAL_TOKEN) {
        return Err(ResolveError::InvalidPath {
            reason: "traversal token in request".to_owned(),
        });
    }
    Ok(())
}

fn require_single_component(filename: &str) -> Result<(), ResolveError> {
    let invalid = |reason: &str| ResolveError::InvalidPath {
        reason: reason.to_owned(),
    };

    if filename.contains(['/', '\\', '\0']) {
        return Err(invalid("filename contains a separator"));
    }
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename => Ok(()),
        _ => Err(invalid("filename is not a plain name")),
    }
}

fn require_file(path: &Path) -> Result<(), ResolveError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(not_found(path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found(path)),
        Err(e) => Err(ResolveError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

fn require_within(path: &Path, root: &Path) -> Result<(), ResolveError> {
    let canonicalize = |p: &Path| {
        p.canonicalize().map_err(|e| ResolveError::Io {
            path: p.display().to_string(),
            reason: e.to_string(),
        })
    };

    if canonicalize(path)?.starts_with(canonicalize(root)?) {
        Ok(())
    } else {
        Err(ResolveError::InvalidPath {
            reason: "path resolves outside the tasks root".to_owned(),
        })
    }
}

fn not_found(path: &Path) -> ResolveError {
    ResolveError::NotFound {
        path: path.display().to_string(),
    }
}
