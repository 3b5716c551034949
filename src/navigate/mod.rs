//! Navigate module
//!
//! Client-side directory navigation on top of the storage service,
//! including the refresh-after-mutation contract of the file explorer.

mod service;
mod state;

// Re-export public types
pub use service::FileService;
pub use state::{Activation, Navigator};
