//! Error types for the question-answering service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for DocuSearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// DocuSearch errors
///
/// Variants carrying downstream detail (`Http`, `Storage`, `Io`, ...) are never
/// rendered verbatim to HTTP callers; see [`Error::public_message`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The uploaded bytes are not a readable PDF or have no extractable text
    #[error("Invalid document '{filename}': {message}")]
    InvalidDocument { filename: String, message: String },

    /// Indexing was asked to process zero chunks
    #[error("Nothing to index: {0}")]
    EmptyInput(String),

    /// The vector index was queried before it was created
    #[error("Vector index has not been created")]
    IndexNotInitialized,

    /// The engine has no index yet
    #[error("No documents have been indexed")]
    NotIndexed,

    /// Removal target does not exist
    #[error("No documents found for {0}")]
    NotFound(String),

    /// Language model call failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding call failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upload exceeds a size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Operation did not finish within the boundary timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Backing store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid document error
    pub fn invalid_document(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for the "removal target absent" kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidDocument { .. } => "invalid_document",
            Error::EmptyInput(_) => "empty_input",
            Error::IndexNotInitialized => "index_not_initialized",
            Error::NotIndexed => "not_indexed",
            Error::NotFound(_) => "not_found",
            Error::Generation(_) => "generation_error",
            Error::Embedding(_) => "embedding_error",
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge(_) => "payload_too_large",
            Error::Timeout(_) => "timeout",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Human-readable summary that is safe to hand to callers.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidDocument { filename, message } => {
                format!("{}: {}", filename, message)
            }
            Error::EmptyInput(msg)
            | Error::Generation(msg)
            | Error::Embedding(msg)
            | Error::Validation(msg)
            | Error::PayloadTooLarge(msg)
            | Error::Timeout(msg) => msg.clone(),
            Error::IndexNotInitialized | Error::NotIndexed => "Upload files first".to_string(),
            Error::NotFound(filename) => format!("No documents found for {}", filename),
            Error::Json(_) => "Malformed JSON payload".to_string(),
            Error::Config(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Http(_)
            | Error::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// HTTP status for the boundary layer
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidDocument { .. }
            | Error::EmptyInput(_)
            | Error::IndexNotInitialized
            | Error::NotIndexed
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Generation(_) | Error::Embedding(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Config(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Http(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}
