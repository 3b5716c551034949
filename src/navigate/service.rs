//! The file service contract the navigation state is written against.

use crate::error::StorageError;
use crate::storage::{Entry, RelativePath, Storage};
use crate::transfer::read_to_end;

/// Operations a file explorer needs from the storage service.
#[allow(async_fn_in_trait)]
pub trait FileService {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>, StorageError>;

    /// Returns the file name and the full content.
    async fn read(&self, file: &str) -> Result<(String, Vec<u8>), StorageError>;

    async fn upload(
        &self,
        dir: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<Entry, StorageError>;

    async fn mkdir(&self, dir: &str, name: &str) -> Result<RelativePath, StorageError>;

    async fn delete(&self, path: &str) -> Result<RelativePath, StorageError>;
}

impl FileService for Storage {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>, StorageError> {
        Storage::list(self, dir).await
    }

    async fn read(&self, file: &str) -> Result<(String, Vec<u8>), StorageError> {
        let download = Storage::read(self, file).await?;
        let filename = download.filename.clone();
        let content = self
            .timed(async { read_to_end(download).await.map_err(StorageError::from) })
            .await?;
        Ok((filename, content))
    }

    async fn upload(
        &self,
        dir: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<Entry, StorageError> {
        Storage::upload(self, dir, filename, content).await
    }

    async fn mkdir(&self, dir: &str, name: &str) -> Result<RelativePath, StorageError> {
        Storage::mkdir(self, dir, name).await
    }

    async fn delete(&self, path: &str) -> Result<RelativePath, StorageError> {
        Storage::delete(self, path).await
    }
}
