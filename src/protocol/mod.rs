//! HTTP protocol layer
//!
//! Handles request extraction, routing and response generation for the
//! file API.

pub mod handlers;
pub mod responses;
pub mod routes;

pub use routes::router;
