use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clock::TimezonePolicy;
use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_DESCRIPTION, DEFAULT_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Directory holding the stats file. Created on startup if missing.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Which clock the day/hour buckets follow.
    #[serde(default)]
    pub timezone: TimezonePolicy,
    /// Written into newly created documents only; loaded files keep theirs.
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
            timezone: TimezonePolicy::default(),
            description: default_description(),
        }
    }
}

impl StatsConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

pub fn load_or_init_config(path: &Path) -> anyhow::Result<StatsConfig> {
    if path.exists() {
        let txt = std::fs::read_to_string(path)?;
        let cfg: StatsConfig = toml::from_str(&txt)?;
        return Ok(cfg);
    }
    let cfg = StatsConfig::default();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(&cfg)?)?;
    Ok(cfg)
}
