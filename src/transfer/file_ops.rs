//! Module `file_ops`
//!
//! Moves file content between memory and disk. Uploads are written to a
//! hidden staging file next to the target and renamed into place once the
//! data is synced, so readers only ever see complete files.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::storage::FileDownload;

const STAGING_SUFFIX: &str = ".upload-part";

/// Whether `name` is an upload staging file that must stay out of listings.
pub fn is_staging_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGING_SUFFIX)
}

fn staging_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(
        ".{}.{}{}",
        file_name,
        Uuid::new_v4().simple(),
        STAGING_SUFFIX
    ))
}

/// Write `content` to `target`, replacing any existing file.
///
/// The staging file is removed if any step fails.
pub async fn write_atomically(target: &Path, content: &[u8]) -> io::Result<()> {
    let staging = staging_path(target);

    match write_then_rename(&staging, target, content).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(
                        "Failed to remove staging file {}: {cleanup}",
                        staging.display()
                    );
                }
            }
            Err(e)
        }
    }
}

async fn write_then_rename(staging: &Path, target: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(staging).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    debug!(
        "Staged {} bytes at {}, moving to {}",
        content.len(),
        staging.display(),
        target.display()
    );
    fs::rename(staging, target).await
}

/// Read the whole content of an opened download into memory.
pub async fn read_to_end(download: FileDownload) -> io::Result<Vec<u8>> {
    let FileDownload { mut file, size, .. } = download;
    let mut content = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    file.read_to_end(&mut content).await?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_staging_file_detection() {
        let staging = staging_path(Path::new("/root/q1.txt"));
        let name = staging.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".q1.txt."));
        assert!(is_staging_file(name));

        assert!(!is_staging_file("q1.txt"));
        assert!(!is_staging_file(".hidden"));
        assert!(!is_staging_file("notes.upload-part"));
    }

    #[tokio::test]
    async fn test_write_atomically_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("data.bin");

        write_atomically(&target, b"first").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        write_atomically(&target, b"second version").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second version");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| is_staging_file(&e.file_name().to_string_lossy()))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing").join("data.bin");

        assert!(write_atomically(&target, b"data").await.is_err());
        assert!(!dir.path().join("missing").exists());
    }
}
