use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading or renumbering a book.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("no chapter with index {index}")]
    NotFound { index: usize },

    #[error("index {index} is claimed by more than one chapter: {}", .names.join(", "))]
    AmbiguousIndex { index: usize, names: Vec<String> },

    #[error("already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("directory is not empty: {}", .path.display())]
    NonEmptyDirectory { path: PathBuf },

    #[error("name does not follow the chapter pattern: {name}")]
    MalformedName { name: String },

    #[error("chapter tree is inconsistent: {0}")]
    Inconsistent(String),

    #[error("a rename plan was interrupted, run `wct resume` first: {}", .path.display())]
    PendingPlan { path: PathBuf },

    #[error("no interrupted rename plan to resume")]
    NoPendingPlan,

    #[error("plan journal: {0}")]
    Journal(String),

    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BookError>;

impl BookError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True when the backend reported a missing path (as opposed to a missing chapter).
    pub fn is_missing_path(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
