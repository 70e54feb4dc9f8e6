use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, StatsError};

use super::model::DailyDocument;

/// Where the whole document is loaded from and written back to.
pub trait StatsBackend: Send + Sync {
    /// Fails with [`StatsError::NotFound`] when nothing has been stored yet.
    fn load(&self) -> Result<DailyDocument>;
    fn save(&self, doc: &DailyDocument) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stats".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()))
    }
}

impl StatsBackend for JsonFileBackend {
    fn load(&self) -> Result<DailyDocument> {
        let txt = match std::fs::read_to_string(&self.path) {
            Ok(txt) => txt,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StatsError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(StatsError::storage(&self.path, e)),
        };
        serde_json::from_str(&txt).map_err(|source| StatsError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, doc: &DailyDocument) -> Result<()> {
        let txt = serde_json::to_string_pretty(doc).map_err(|e| {
            StatsError::storage(&self.path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;
        let tmp = self.tmp_path();
        if let Err(e) = std::fs::write(&tmp, txt) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StatsError::storage(&tmp, e));
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StatsError::storage(&self.path, e));
        }
        Ok(())
    }
}

/// Creates `dir` (and parents) with owner-rwx, group/other-rx permissions.
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(dir)
        .map_err(|e| StatsError::storage(dir, e))
}
