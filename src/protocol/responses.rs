//! HTTP response bodies
//!
//! Defines the JSON payloads returned by the file API and the framing of
//! file downloads.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::storage::results::serialize_iso8601;
use crate::storage::{Entry, FileDownload, RelativePath};

pub const FILE_DELETED: &str = "File deleted successfully";
pub const TREE_DELETED: &str = "Directory tree deleted successfully";
pub const DIRECTORY_CREATED: &str = "Directory created successfully";
pub const DOWNLOAD_FAILED: &str = "Failed to download file";

/// Body returned by delete and mkdir.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    pub path: RelativePath,
}

impl MutationResponse {
    pub fn new(message: &str, path: RelativePath) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            path,
        }
    }
}

/// Body returned by a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: UploadedFile,
}

/// Descriptor of the stored file as read back from disk.
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    #[serde(serialize_with = "serialize_iso8601")]
    pub modified: DateTime<Utc>,
    pub path: RelativePath,
}

impl From<Entry> for UploadResponse {
    fn from(entry: Entry) -> Self {
        Self {
            success: true,
            file: UploadedFile {
                name: entry.name,
                size: entry.size,
                modified: entry.modified,
                path: entry.path,
            },
        }
    }
}

/// Stream a file to the client as a generic binary attachment.
pub fn download_response(download: FileDownload) -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        disposition_header(&download.filename)?,
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(download.size));

    info!("Sending {} ({} bytes)", download.path, download.size);

    let body = Body::from_stream(ReaderStream::new(download.file));
    Ok((StatusCode::OK, headers, body).into_response())
}

fn disposition_header(filename: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&content_disposition(filename)).map_err(|e| {
        error!("Cannot build Content-Disposition for {filename:?}: {e}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED)
    })
}

fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
