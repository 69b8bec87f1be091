//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdserve_cache::CacheError;
use mdserve_site::RenderError;
use mdserve_storage::StorageError;

/// Server error type.
///
/// Every variant is scoped to one request. The response body is the reason
/// phrase of the status code so internal details never reach the client.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No source document for the key.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cache transaction failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Markdown or template rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The blocking request task panicked or was cancelled.
    #[error("Request task failed: {0}")]
    Task(String),
}

impl ServerError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Cache(_) | Self::Render(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
