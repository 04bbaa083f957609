//! File system paths for the admin tools.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths under the base directory.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for config and logs (~/.carrier-admin)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.carrier-admin`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".carrier-admin"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.carrier-admin/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Ensure the base and logs directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
