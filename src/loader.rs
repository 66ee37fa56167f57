//! # Loader
//!
//! The [`Loader`] trait is the seam between dataset resolution and actual retrieval.
//! Dataset code only ever calls `load_source`; what happens behind it (filesystem, HTTP,
//! S3, test doubles) is up to the implementation.
//!
//! [`StorageLoader`] is the default implementation on top of [`crate::storage`].

use crate::source::{Source, SourceError, SourceKind};
use crate::storage::{StorageBackend, StorageFactory};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Retrieves a resource and hands back an owned [`Source`]
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    async fn load_source(&self, kind: SourceKind, locator: &str) -> Result<Source, SourceError>;
}

/// Loader backed by the storage backends
///
/// `file` locators are resolved against `base_dir`; `url` locators must be HTTP(S) URLs and
/// `s3` locators must be `s3://` paths. No retries and no caching: every call reads again.
#[derive(Debug, Clone)]
pub struct StorageLoader {
    base_dir: PathBuf,
}

impl StorageLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Loader rooted at the process working directory.
    pub fn in_current_dir() -> Self {
        Self::new(".")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Maps a `(kind, locator)` pair to the path handed to the storage layer.
    pub fn storage_path(&self, kind: SourceKind, locator: &str) -> Result<String, SourceError> {
        let valid = match kind {
            SourceKind::File => StorageFactory::is_local_path(locator),
            SourceKind::Url => StorageFactory::is_http_path(locator),
            SourceKind::S3 => StorageFactory::is_s3_path(locator),
        };
        if !valid || locator.is_empty() {
            return Err(SourceError::InvalidLocator {
                kind,
                locator: locator.to_string(),
            });
        }

        Ok(match kind {
            SourceKind::File => self.base_dir.join(locator).to_string_lossy().into_owned(),
            SourceKind::Url | SourceKind::S3 => locator.to_string(),
        })
    }
}

impl Default for StorageLoader {
    fn default() -> Self {
        Self::in_current_dir()
    }
}

#[async_trait::async_trait]
impl Loader for StorageLoader {
    async fn load_source(&self, kind: SourceKind, locator: &str) -> Result<Source, SourceError> {
        let path = self.storage_path(kind, locator)?;
        debug!("Loading {} source '{}' from {}", kind, locator, path);

        let storage = StorageFactory::from_path(&path).await?;
        let data = storage.read(&path).await?;

        info!("Loaded {} bytes from {}", data.len(), path);
        Ok(Source::from_bytes(kind, locator, data))
    }
}
