use crate::services::{
    asset_service::AssetError, storage_service::StorageError, token_service::SecretError,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// An HTTP error with a short plain-text message safe to show callers.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Status only, no body.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, "")
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.message.is_empty() {
            return self.status.into_response();
        }
        (self.status, self.message).into_response()
    }
}

// Backend failures are logged here and never echoed to the caller.

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!("object store failure: {}", err);
        AppError::internal("Internal Server Error")
    }
}

impl From<SecretError> for AppError {
    fn from(err: SecretError) -> Self {
        tracing::error!("secret store failure: {}", err);
        AppError::internal("Internal Server Error")
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(path) => {
                tracing::debug!("asset {} not found", path);
            }
            other => tracing::error!("asset fetch failed: {}", other),
        }
        AppError::not_found("Not Found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn renders_plain_text() {
        let response = AppError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert_eq!(body_text(response).await, "Unauthorized");
    }

    #[tokio::test]
    async fn empty_message_has_no_body() {
        let response = AppError::empty(StatusCode::NOT_FOUND).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("content-type").is_none());
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn storage_errors_hide_details() {
        let err = StorageError::Io(io::Error::other("disk on fire at /srv/data"));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }
}
