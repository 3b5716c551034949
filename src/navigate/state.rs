//! Module `state`
//!
//! Client-side navigation state for a file explorer: the current directory,
//! its cached listing, and the rules that keep that cache in step with the
//! service after each mutation.

use log::{info, warn};

use crate::error::StorageError;
use crate::navigate::service::FileService;
use crate::storage::{Entry, RelativePath};

/// Outcome of activating (clicking) an entry.
#[derive(Debug, PartialEq, Eq)]
pub enum Activation {
    /// A directory was entered and its listing cached.
    Navigated,
    /// A file was fetched; navigation state is unchanged.
    Downloaded { filename: String, content: Vec<u8> },
}

/// Tracks the directory a client is looking at.
///
/// Failed calls never modify the state. Successful mutations are followed by
/// a re-list of the current directory.
pub struct Navigator<S> {
    service: S,
    current_path: RelativePath,
    entries: Vec<Entry>,
}

impl<S: FileService> Navigator<S> {
    /// Creates a navigator at the root with an empty cache.
    pub fn new(service: S) -> Self {
        Self {
            service,
            current_path: RelativePath::root(),
            entries: Vec::new(),
        }
    }

    /// Creates a navigator at the root and loads its listing.
    pub async fn open(service: S) -> Result<Self, StorageError> {
        let mut navigator = Self::new(service);
        navigator.refresh().await?;
        Ok(navigator)
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn current_path(&self) -> &RelativePath {
        &self.current_path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// "Up" is disabled at the root.
    pub fn can_navigate_up(&self) -> bool {
        !self.current_path.is_root()
    }

    // --------------------
    // Navigation
    // --------------------

    /// Re-lists the current directory.
    pub async fn refresh(&mut self) -> Result<(), StorageError> {
        self.entries = self.service.list(self.current_path.as_str()).await?;
        Ok(())
    }

    /// Lists `path` and, on success, makes it the current directory.
    pub async fn navigate_to(&mut self, path: RelativePath) -> Result<(), StorageError> {
        let entries = self.service.list(path.as_str()).await?;
        info!("Navigated to {} ({} entries)", path, entries.len());
        self.current_path = path;
        self.entries = entries;
        Ok(())
    }

    /// Moves to the parent directory. Returns `false` without any call when
    /// already at the root.
    pub async fn navigate_up(&mut self) -> Result<bool, StorageError> {
        match self.current_path.parent() {
            Some(parent) => {
                self.navigate_to(parent).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Directories are entered; files are downloaded.
    pub async fn activate(&mut self, entry: &Entry) -> Result<Activation, StorageError> {
        if entry.is_dir() {
            self.navigate_to(entry.path.clone()).await?;
            return Ok(Activation::Navigated);
        }

        let (filename, content) = self.service.read(entry.path.as_str()).await?;
        Ok(Activation::Downloaded { filename, content })
    }

    // --------------------
    // Mutations
    // --------------------

    /// Uploads into the current directory.
    pub async fn upload(&mut self, filename: &str, content: &[u8]) -> Result<Entry, StorageError> {
        let entry = self
            .service
            .upload(self.current_path.as_str(), filename, content)
            .await?;
        self.resync().await;
        Ok(entry)
    }

    /// Creates a directory inside the current directory.
    pub async fn create_folder(&mut self, name: &str) -> Result<RelativePath, StorageError> {
        let created = self
            .service
            .mkdir(self.current_path.as_str(), name)
            .await?;
        self.resync().await;
        Ok(created)
    }

    /// Deletes an entry by its relative path.
    pub async fn delete(&mut self, path: &RelativePath) -> Result<RelativePath, StorageError> {
        let deleted = self.service.delete(path.as_str()).await?;
        self.resync().await;
        Ok(deleted)
    }

    async fn resync(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(
                "Failed to refresh {} after mutation, listing is stale: {}",
                self.current_path, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, StorageLimits};
    use tempfile::{TempDir, tempdir};

    async fn make_navigator() -> (TempDir, Navigator<Storage>) {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), StorageLimits::default());
        storage.mkdir("", "reports").await.unwrap();
        storage.upload("", "readme.txt", b"read me").await.unwrap();
        let navigator = Navigator::open(storage).await.unwrap();
        (temp, navigator)
    }

    fn entry<'a>(navigator: &'a Navigator<Storage>, name: &str) -> &'a Entry {
        navigator
            .entries()
            .iter()
            .find(|e| e.name == name)
            .unwrap()
    }

    #[tokio::test]
    async fn test_opens_at_root() {
        let (_temp, navigator) = make_navigator().await;
        assert!(navigator.current_path().is_root());
        assert_eq!(navigator.entries().len(), 2);
        assert!(!navigator.can_navigate_up());
    }

    #[tokio::test]
    async fn test_activating_directory_navigates() {
        let (_temp, mut navigator) = make_navigator().await;
        let reports = entry(&navigator, "reports").clone();

        let outcome = navigator.activate(&reports).await.unwrap();
        assert_eq!(outcome, Activation::Navigated);
        assert_eq!(navigator.current_path().as_str(), "reports");
        assert!(navigator.entries().is_empty());
        assert!(navigator.can_navigate_up());
    }

    #[tokio::test]
    async fn test_activating_file_downloads_without_navigation() {
        let (_temp, mut navigator) = make_navigator().await;
        let readme = entry(&navigator, "readme.txt").clone();

        let outcome = navigator.activate(&readme).await.unwrap();
        assert_eq!(
            outcome,
            Activation::Downloaded {
                filename: "readme.txt".into(),
                content: b"read me".to_vec(),
            }
        );
        assert!(navigator.current_path().is_root());
        assert_eq!(navigator.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_navigation_leaves_state_unchanged() {
        let (_temp, mut navigator) = make_navigator().await;
        let before = navigator.entries().to_vec();

        let result = navigator
            .navigate_to(RelativePath::parse("ghost").unwrap())
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(navigator.current_path().is_root());
        assert_eq!(navigator.entries(), before.as_slice());
    }

    #[tokio::test]
    async fn test_navigate_up() {
        let (_temp, mut navigator) = make_navigator().await;

        assert!(!navigator.navigate_up().await.unwrap());

        navigator.create_folder("reports/2024").await.unwrap();
        navigator
            .navigate_to(RelativePath::parse("reports/2024").unwrap())
            .await
            .unwrap();

        assert!(navigator.navigate_up().await.unwrap());
        assert_eq!(navigator.current_path().as_str(), "reports");
        assert_eq!(navigator.entries().len(), 1);

        assert!(navigator.navigate_up().await.unwrap());
        assert!(navigator.current_path().is_root());
        assert!(!navigator.can_navigate_up());
    }

    #[tokio::test]
    async fn test_mutations_refresh_listing() {
        let (_temp, mut navigator) = make_navigator().await;
        let reports = entry(&navigator, "reports").clone();
        navigator.activate(&reports).await.unwrap();

        let uploaded = navigator.upload("q1.txt", b"hello").await.unwrap();
        assert_eq!(uploaded.path.as_str(), "reports/q1.txt");
        assert_eq!(navigator.entries().len(), 1);
        assert_eq!(navigator.entries()[0].size, 5);

        navigator.create_folder("archive").await.unwrap();
        assert_eq!(navigator.entries().len(), 2);

        navigator.delete(&uploaded.path).await.unwrap();
        assert_eq!(navigator.entries().len(), 1);
        assert_eq!(navigator.entries()[0].name, "archive");
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let (_temp, mut navigator) = make_navigator().await;
        // Created behind the navigator's back, so the cache is stale
        navigator
            .service()
            .upload("", "late.txt", b"x")
            .await
            .unwrap();

        let result = navigator.create_folder("reports").await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(navigator.entries().len(), 2);

        navigator.refresh().await.unwrap();
        assert_eq!(navigator.entries().len(), 3);
    }
}
