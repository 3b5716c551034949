//! Storage operations
//!
//! Handles the file operations exposed to clients: list, open/read, upload,
//! mkdir and delete. Every operation resolves its path through the
//! containment check before touching the filesystem and runs under the
//! storage I/O timeout.
//!
//! No locks are held across the resolve/check/mutate steps. `mkdir` relies on
//! the create-exclusive `create_dir` so the OS decides name collisions; a
//! delete racing an upload of the same path may land in either order.

use log::{debug, error, info};
use std::fs::Metadata;
use std::path::Path;
use tokio::fs::{self, File};

use crate::error::StorageError;
use crate::storage::filesystem::{Storage, is_missing};
use crate::storage::path::{RelativePath, validate_entry_name, validate_nested_name};
use crate::storage::results::{Entry, FileDownload, Target};
use crate::transfer::{is_staging_file, write_atomically};

impl Storage {
    /// Opens a path: directories are listed, files are opened for download.
    pub async fn open(&self, raw: &str) -> Result<Target, StorageError> {
        self.timed(async {
            let (relative, real) = self.resolve_checked(raw).await?;
            let metadata = stat(&relative, &real).await?;

            if metadata.is_dir() {
                Ok(Target::Directory(read_entries(&relative, &real).await?))
            } else {
                Ok(Target::File(open_file(relative, &real, &metadata).await?))
            }
        })
        .await
    }

    /// Lists the contents of a directory in enumeration order.
    pub async fn list(&self, raw: &str) -> Result<Vec<Entry>, StorageError> {
        self.timed(async {
            let (relative, real) = self.resolve_checked(raw).await?;
            let metadata = stat(&relative, &real).await?;

            if !metadata.is_dir() {
                return Err(StorageError::NotADirectory(relative.to_string()));
            }

            read_entries(&relative, &real).await
        })
        .await
    }

    /// Opens a single file for reading.
    pub async fn read(&self, raw: &str) -> Result<FileDownload, StorageError> {
        self.timed(async {
            let (relative, real) = self.resolve_checked(raw).await?;
            let metadata = stat(&relative, &real).await?;

            if metadata.is_dir() {
                return Err(StorageError::NotAFile(relative.to_string()));
            }

            open_file(relative, &real, &metadata).await
        })
        .await
    }

    /// Writes `content` as `filename` inside `dir`, replacing any existing file.
    ///
    /// The returned entry is built from the metadata read back after the write.
    pub async fn upload(
        &self,
        dir: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<Entry, StorageError> {
        validate_entry_name(filename)?;
        if is_staging_file(filename) {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }
        let target = RelativePath::parse(dir)?.join(filename)?;

        let size = content.len() as u64;
        let limit = self.limits().max_upload_bytes;
        if size > limit {
            return Err(StorageError::PayloadTooLarge { size, limit });
        }

        self.timed(async {
            let (relative, real) = self.resolve_checked(target.as_str()).await?;

            if let Err(source) = write_atomically(&real, content).await {
                error!(
                    "Failed to store file {} (real: {}): {}",
                    relative,
                    real.display(),
                    source
                );
                return Err(StorageError::WriteFailed {
                    path: relative.to_string(),
                    source,
                });
            }

            let metadata =
                fs::symlink_metadata(&real)
                    .await
                    .map_err(|source| StorageError::WriteFailed {
                        path: relative.to_string(),
                        source,
                    })?;

            info!(
                "Stored file {} (real: {}) - {} bytes",
                relative,
                real.display(),
                metadata.len()
            );

            Ok(Entry::from_metadata(filename.to_string(), relative, &metadata))
        })
        .await
    }

    /// Creates directory `name` inside `dir`, including missing parents.
    pub async fn mkdir(&self, dir: &str, name: &str) -> Result<RelativePath, StorageError> {
        validate_nested_name(name)?;
        if name.split(['/', '\\']).any(is_staging_file) {
            return Err(StorageError::InvalidPath(name.to_string()));
        }
        let target = RelativePath::parse(dir)?.join(name)?;

        self.timed(async {
            let (relative, real) = self.resolve_checked(target.as_str()).await?;

            if let Some(parent) = real.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StorageError::WriteFailed {
                        path: relative.to_string(),
                        source,
                    })?;
            }

            match fs::create_dir(&real).await {
                Ok(()) => {
                    info!("Created directory {} (real: {})", relative, real.display());
                    Ok(relative)
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    Err(StorageError::AlreadyExists(relative.to_string()))
                }
                Err(source) => {
                    error!(
                        "Failed to create directory {} (real: {}): {}",
                        relative,
                        real.display(),
                        source
                    );
                    Err(StorageError::WriteFailed {
                        path: relative.to_string(),
                        source,
                    })
                }
            }
        })
        .await
    }

    /// Deletes a single file or empty directory.
    ///
    /// Non-empty directories are not removed; use [`Storage::delete_tree`].
    pub async fn delete(&self, raw: &str) -> Result<RelativePath, StorageError> {
        self.remove(raw, false).await
    }

    /// Deletes a file, or a directory together with everything below it.
    pub async fn delete_tree(&self, raw: &str) -> Result<RelativePath, StorageError> {
        self.remove(raw, true).await
    }

    async fn remove(&self, raw: &str, recursive: bool) -> Result<RelativePath, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::PathRequired);
        }

        let target = RelativePath::parse(raw)?;
        if target.is_root() {
            return Err(StorageError::InvalidPath(
                "the storage root cannot be deleted".into(),
            ));
        }

        self.timed(async {
            let (relative, real) = self.resolve_checked(target.as_str()).await?;
            let metadata = stat(&relative, &real).await?;

            let result = match (metadata.is_dir(), recursive) {
                (true, true) => fs::remove_dir_all(&real).await,
                (true, false) => fs::remove_dir(&real).await,
                (false, _) => fs::remove_file(&real).await,
            };

            match result {
                Ok(()) => {
                    info!("Deleted {} (real: {})", relative, real.display());
                    Ok(relative)
                }
                Err(e) if is_missing(&e) => Err(StorageError::NotFound(relative.to_string())),
                Err(source) => {
                    error!(
                        "Failed to delete {} (real: {}): {}",
                        relative,
                        real.display(),
                        source
                    );
                    Err(StorageError::DeleteFailed {
                        path: relative.to_string(),
                        source,
                    })
                }
            }
        })
        .await
    }
}

async fn stat(relative: &RelativePath, real: &Path) -> Result<Metadata, StorageError> {
    fs::symlink_metadata(real).await.map_err(|e| {
        if is_missing(&e) {
            StorageError::NotFound(relative.to_string())
        } else {
            StorageError::Io(e)
        }
    })
}

async fn read_entries(relative: &RelativePath, real: &Path) -> Result<Vec<Entry>, StorageError> {
    let mut dir = fs::read_dir(real).await?;
    let mut entries = Vec::new();

    while let Some(item) = dir.next_entry().await? {
        let Ok(name) = item.file_name().into_string() else {
            debug!("Skipping non UTF-8 entry in {}", real.display());
            continue;
        };

        if is_staging_file(&name) || validate_entry_name(&name).is_err() {
            continue;
        }

        let metadata = match item.metadata().await {
            Ok(metadata) => metadata,
            // Removed between enumeration and stat
            Err(e) if is_missing(&e) => continue,
            Err(e) => return Err(StorageError::Io(e)),
        };

        if metadata.file_type().is_symlink() {
            debug!("Skipping symlink {name} in {}", real.display());
            continue;
        }

        let path = match relative.join(&name) {
            Ok(path) => path,
            Err(e) => {
                debug!("Skipping entry {name} in {}: {e}", real.display());
                continue;
            }
        };
        entries.push(Entry::from_metadata(name, path, &metadata));
    }

    info!(
        "Listed directory {} (real: {}) - {} entries",
        relative,
        real.display(),
        entries.len()
    );

    Ok(entries)
}

async fn open_file(
    relative: RelativePath,
    real: &Path,
    metadata: &Metadata,
) -> Result<FileDownload, StorageError> {
    let file = File::open(real).await.map_err(|e| {
        if is_missing(&e) {
            StorageError::NotFound(relative.to_string())
        } else {
            StorageError::Io(e)
        }
    })?;

    let filename = relative.file_name().unwrap_or_default().to_string();
    info!(
        "Prepared file retrieval for {} (real: {}) - {} bytes",
        relative,
        real.display(),
        metadata.len()
    );

    Ok(FileDownload {
        file,
        filename,
        size: metadata.len(),
        path: relative,
    })
}
