//! Server core functionality
//!
//! This module contains the listener setup and lifecycle of the HTTP server.

pub mod core;

pub use self::core::Server;
