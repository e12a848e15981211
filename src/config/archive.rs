//! Archive configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where closed threads are recorded
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Archive store file
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl ArchiveConfig {
    /// Validate archive configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("archive.path"));
        }
        Ok(())
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("database.json")
}
