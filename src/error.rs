use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Directory or file could not be created or written.
    #[error("stats storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// No stats file exists yet. Recoverable: callers create a fresh document.
    #[error("stats file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to decode stats file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// An existing stats file could not be turned into a document during startup.
    #[error("stats file {} is corrupt: {reason}", .path.display())]
    CorruptState { path: PathBuf, reason: String },
}

impl StatsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatsError::NotFound(_))
    }

    /// File or directory the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            StatsError::StorageUnavailable { path, .. }
            | StatsError::Decode { path, .. }
            | StatsError::CorruptState { path, .. } => path,
            StatsError::NotFound(path) => path,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatsError::StorageUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
