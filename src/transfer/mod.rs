//! Transfer module
//!
//! Handles moving file content in and out of the storage root.

pub mod file_ops;

pub use file_ops::{is_staging_file, read_to_end, write_atomically};
