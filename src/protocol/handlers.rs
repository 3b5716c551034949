//! Request handlers for the file API.
//!
//! Each handler validates its input, calls the storage layer and maps
//! storage errors through [`handle_error`] into a JSON error body.

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Response};
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::handlers::handle_error;
use crate::error::{ApiError, Operation};
use crate::protocol::responses::{
    DIRECTORY_CREATED, FILE_DELETED, MutationResponse, TREE_DELETED, UploadResponse,
    download_response,
};
use crate::storage::{Storage, Target};

/// `?path=` query of the list/download and delete routes.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

/// JSON body of `POST /files/mkdir`.
#[derive(Debug, Deserialize)]
pub struct MkdirRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /files`: lists a directory, or downloads the file the path names.
pub async fn list_or_download(
    State(storage): State<Arc<Storage>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = query.path.unwrap_or_default();

    match storage
        .open(&path)
        .await
        .map_err(|e| handle_error(Operation::List, e))?
    {
        Target::Directory(entries) => Ok(Json(entries).into_response()),
        Target::File(download) => download_response(download),
    }
}

/// `POST /files`: multipart upload with a `file` part and an optional
/// `path` part naming the target directory.
pub async fn upload_file(
    State(storage): State<Arc<Storage>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut target_dir = String::new();
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                upload = Some((filename, content));
            }
            Some("path") => target_dir = field.text().await?,
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }

    let Some((filename, content)) = upload else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let entry = storage
        .upload(&target_dir, &filename, &content)
        .await
        .map_err(|e| handle_error(Operation::Upload, e))?;

    Ok(Json(UploadResponse::from(entry)))
}

/// `DELETE /files`: removes one file or empty directory.
pub async fn delete_entry(
    State(storage): State<Arc<Storage>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let path = query.path.unwrap_or_default();
    let deleted = storage
        .delete(&path)
        .await
        .map_err(|e| handle_error(Operation::Delete, e))?;

    Ok(Json(MutationResponse::new(FILE_DELETED, deleted)))
}

/// `DELETE /files/tree`: removes an entry and everything below it.
pub async fn delete_tree(
    State(storage): State<Arc<Storage>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let path = query.path.unwrap_or_default();
    let deleted = storage
        .delete_tree(&path)
        .await
        .map_err(|e| handle_error(Operation::Delete, e))?;

    Ok(Json(MutationResponse::new(TREE_DELETED, deleted)))
}

/// `POST /files/mkdir`
pub async fn create_directory(
    State(storage): State<Arc<Storage>>,
    payload: Result<Json<MkdirRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(request) = payload?;
    let dir = request.path.unwrap_or_default();
    let name = request.name.unwrap_or_default();

    let created = storage
        .mkdir(&dir, &name)
        .await
        .map_err(|e| handle_error(Operation::Mkdir, e))?;

    Ok(Json(MutationResponse::new(DIRECTORY_CREATED, created)))
}
