//! Route table for the file API.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use std::sync::Arc;

use crate::middleware::logging::log_request;
use crate::protocol::handlers::{
    create_directory, delete_entry, delete_tree, list_or_download, upload_file,
};
use crate::storage::Storage;

/// Room for multipart boundaries and the `path` field on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the application router. All routes live under `/api`.
pub fn router(storage: Arc<Storage>) -> Router {
    let body_limit = usize::try_from(storage.limits().max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let files = Router::new()
        .route(
            "/files",
            get(list_or_download).post(upload_file).delete(delete_entry),
        )
        .route("/files/mkdir", post(create_directory))
        .route("/files/tree", delete(delete_tree))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(storage);

    Router::new()
        .nest("/api", files)
        .layer(middleware::from_fn(log_request))
}
