//! Error handlers
//!
//! Maps storage errors onto HTTP status codes and client-facing messages.

use axum::http::StatusCode;
use log::{error, warn};

use crate::error::types::{ApiError, StorageError};

/// The client-visible operation a storage error came from.
///
/// Messages for the same error differ per operation, e.g. a missing target is
/// "Path does not exist" for a listing but "File does not exist" for a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Upload,
    Mkdir,
    Delete,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to list files",
            Operation::Upload => "Failed to upload file",
            Operation::Mkdir => "Failed to create directory",
            Operation::Delete => "Failed to delete file",
        }
    }

    fn not_found_message(self) -> &'static str {
        match self {
            Operation::Delete => "File does not exist",
            _ => "Path does not exist",
        }
    }
}

/// Convert a storage error to its HTTP status code
pub fn status_code(err: &StorageError) -> StatusCode {
    match err {
        StorageError::InvalidPath(_)
        | StorageError::NameRequired
        | StorageError::PathRequired
        | StorageError::NotADirectory(_)
        | StorageError::NotAFile(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::AlreadyExists(_) => StatusCode::CONFLICT,
        StorageError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StorageError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        StorageError::WriteFailed { .. }
        | StorageError::DeleteFailed { .. }
        | StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a storage error and turn it into the response for `op`.
///
/// Server-side failures get a fixed message; the cause only goes to the log.
pub fn handle_error(op: Operation, err: StorageError) -> ApiError {
    let status = status_code(&err);

    if status.is_server_error() {
        error!("{op:?} failed: {err}");
    } else {
        warn!("{op:?} rejected: {err}");
    }

    let message = match &err {
        StorageError::InvalidPath(_) => "Invalid path".to_string(),
        StorageError::NotFound(_) => op.not_found_message().to_string(),
        StorageError::AlreadyExists(_) => "Directory already exists".to_string(),
        StorageError::NameRequired if op == Operation::Upload => "No file provided".to_string(),
        StorageError::NameRequired => "Directory name is required".to_string(),
        StorageError::PathRequired => "File path is required".to_string(),
        StorageError::Timeout(_) => "Operation timed out".to_string(),
        _ if status.is_server_error() => op.failure_message().to_string(),
        other => other.to_string(),
    };

    ApiError::new(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_code(&StorageError::InvalidPath("../x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code(&StorageError::NotFound("a".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_code(&StorageError::AlreadyExists("a".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_code(&StorageError::PayloadTooLarge { size: 2, limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_code(&StorageError::Timeout(Duration::from_secs(1))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_code(&StorageError::DeleteFailed {
                path: "a".into(),
                source: io::Error::other("busy"),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_depend_on_operation() {
        let list = handle_error(Operation::List, StorageError::NotFound("x".into()));
        assert_eq!(list.message(), "Path does not exist");

        let delete = handle_error(Operation::Delete, StorageError::NotFound("x".into()));
        assert_eq!(delete.message(), "File does not exist");

        let upload = handle_error(Operation::Upload, StorageError::NameRequired);
        assert_eq!(upload.message(), "No file provided");

        let mkdir = handle_error(Operation::Mkdir, StorageError::NameRequired);
        assert_eq!(mkdir.message(), "Directory name is required");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = handle_error(
            Operation::Upload,
            StorageError::WriteFailed {
                path: "/secret/location".into(),
                source: io::Error::other("disk full"),
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to upload file");
    }
}
