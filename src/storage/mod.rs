//! File system storage management
//!
//! Handles path containment, directory listings and file mutations under a
//! single storage root.

pub mod filesystem;
pub mod operations;
pub mod path;
pub mod results;

pub use filesystem::{Storage, StorageLimits};
pub use path::{RelativePath, resolve};
pub use results::{Entry, EntryKind, FileDownload, Target};
