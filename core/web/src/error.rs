//! Web error type and its HTTP mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use drivedesk_common::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),
}

pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::FolderNotFound(_) => StatusCode::NOT_FOUND,
            WebError::Multipart(_) => StatusCode::BAD_REQUEST,
            WebError::Core(err) => match err {
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::InvalidInput(_) | Error::Unsupported(_) => StatusCode::BAD_REQUEST,
                Error::Authentication(_) | Error::PermissionDenied(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %message, "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
