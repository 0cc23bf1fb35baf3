use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::StoreError;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".beer-tracker";
/// Archive holding the whole collection.
const ARCHIVE_FILE_NAME: &str = "beers.json";
/// Log file written by the tracing subscriber.
const LOG_FILE_NAME: &str = "beer-tracker.log";
const IMAGES_DIR_NAME: &str = "images";
const EXPORTS_DIR_NAME: &str = "exports";
const INBOX_DIR_NAME: &str = "inbox";

/// Environment variable that relocates the data root.
pub const HOME_ENV_VAR: &str = "BEER_TRACKER_HOME";

/// Every on-disk location the application touches, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirs {
    root: PathBuf,
}

impl DataDirs {
    /// Pick the data root: an explicit path wins, then `BEER_TRACKER_HOME`,
    /// then `~/.beer-tracker`.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, StoreError> {
        if let Some(root) = explicit {
            return Ok(Self::at(root));
        }

        if let Some(root) = env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
            return Ok(Self::at(root));
        }

        let base_dirs = BaseDirs::new().ok_or_else(|| {
            StoreError::DirectoryUnavailable("could not locate home directory".to_string())
        })?;
        Ok(Self::at(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root and every subdirectory. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<(), StoreError> {
        for dir in [
            self.root.clone(),
            self.images_dir(),
            self.exports_dir(),
            self.inbox_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE_NAME)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR_NAME)
    }

    /// Where shared `.btkr` files are written.
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join(EXPORTS_DIR_NAME)
    }

    /// Dropped `.btkr` files waiting to be imported.
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(INBOX_DIR_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }
}
