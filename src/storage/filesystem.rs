//! File system storage root
//!
//! Owns the storage root and the limits every operation runs under.

use log::{debug, info};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::config::ServerConfig;
use crate::error::StorageError;
use crate::storage::path::{RelativePath, resolve};

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Resource limits applied to storage operations.
#[derive(Debug, Clone)]
pub struct StorageLimits {
    pub max_upload_bytes: u64,
    pub io_timeout: Duration,
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// Filesystem-backed storage confined to a single root directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    limits: StorageLimits,
}

impl Storage {
    pub fn new(root: PathBuf, limits: StorageLimits) -> Self {
        Self { root, limits }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.storage_root_path(),
            StorageLimits {
                max_upload_bytes: config.max_upload_bytes(),
                io_timeout: config.io_timeout(),
            },
        )
    }

    /// Create the storage root if it does not exist yet.
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!("Storage root directory: {}", self.root.display());
        Ok(())
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> &StorageLimits {
        &self.limits
    }

    /// Resolve a raw client path and make sure no existing component of it
    /// is a symbolic link.
    ///
    /// The lexical containment check runs first, so escaping paths are
    /// rejected without touching the filesystem.
    pub(crate) async fn resolve_checked(
        &self,
        raw: &str,
    ) -> Result<(RelativePath, PathBuf), StorageError> {
        let (relative, real) = resolve(&self.root, raw)?;
        self.ensure_no_symlinks(&relative).await?;
        Ok((relative, real))
    }

    async fn ensure_no_symlinks(&self, relative: &RelativePath) -> Result<(), StorageError> {
        let mut current = self.root.clone();

        for segment in relative.segments() {
            current.push(segment);
            match fs::symlink_metadata(&current).await {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    debug!("Rejected symlink component {}", current.display());
                    return Err(StorageError::InvalidPath(relative.to_string()));
                }
                Ok(_) => continue,
                // Nothing below a missing component can be a link
                Err(e) if is_missing(&e) => return Ok(()),
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        Ok(())
    }

    /// Run a storage operation under the configured I/O timeout.
    pub(crate) async fn timed<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.limits.io_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.limits.io_timeout)),
        }
    }
}

/// Whether an I/O error means the target (or one of its parents) is absent.
pub(crate) fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
