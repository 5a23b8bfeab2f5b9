//! Unified error type
//!
//! `AppError` and `AppResult` built on `thiserror`. `AppError` implements
//! axum's `IntoResponse` so handlers can return it directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// File I/O failure
    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// Missing resource
    #[error("{entity} not found: {detail}")]
    NotFound { entity: &'static str, detail: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// PDF parsing failure
    #[error("pdf parse error: {0}")]
    Pdf(String),

    /// Vector store failure
    #[error("vector store error: {0}")]
    VectorStore(String),

    /// Embedding or LLM failure
    #[error("AI service error: {0}")]
    AiService(String),

    /// Business rule violation
    #[error("{0}")]
    Business(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Io(_) => "io",
            AppError::Validation(_) => "validation",
            AppError::NotFound { .. } => "not_found",
            AppError::Config(_) => "config",
            AppError::Pdf(_) => "pdf",
            AppError::VectorStore(_) => "vector_store",
            AppError::AiService(_) => "ai_service",
            AppError::Business(_) => "business",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AiService(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ========== From: String and &str ==========

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Business(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Business(s.to_string())
    }
}

// ========== Serialize: JSON error body ==========

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("type", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        }
        (status, axum::Json(self)).into_response()
    }
}

/// Application-wide Result alias
pub type AppResult<T> = Result<T, AppError>;

// ========== Extension trait: context helpers on Result ==========

/// Converts any displayable error into an `AppError` variant with context.
pub trait ResultExt<T> {
    /// Maps the error to `Validation`.
    fn validation_err(self, msg: &str) -> AppResult<T>;

    /// Maps the error to `Config`.
    fn config_err(self, msg: &str) -> AppResult<T>;

    /// Maps the error to `Pdf`.
    fn pdf_err(self, msg: &str) -> AppResult<T>;

    /// Maps the error to `VectorStore`.
    fn vector_err(self, msg: &str) -> AppResult<T>;

    /// Maps the error to `AiService`.
    fn ai_err(self, msg: &str) -> AppResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn validation_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Validation(format!("{}: {}", msg, e)))
    }

    fn config_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Config(format!("{}: {}", msg, e)))
    }

    fn pdf_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Pdf(format!("{}: {}", msg, e)))
    }

    fn vector_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::VectorStore(format!("{}: {}", msg, e)))
    }

    fn ai_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::AiService(format!("{}: {}", msg, e)))
    }
}
