use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Message shown to clients whenever an upstream API is unreachable.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str =
    "Internal Error (API's are dead), please try again later";

/// Application-specific error types.
///
/// Address rejections are not errors: they travel as
/// [`Rejection`](crate::validator::Rejection) values.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Transport failure, timeout, open circuit or non-2xx from an upstream API.
    ExternalApiError(String),
    /// Upstream answered but the expected field was missing.
    DataNotFound(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Strips any context wrappers and returns the root error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status for the root error.
    pub fn status(&self) -> StatusCode {
        match self.root() {
            AppError::ExternalApiError(_) | AppError::DataNotFound(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to return to clients; upstream details stay in the logs.
    pub fn client_message(&self) -> String {
        match self.root() {
            AppError::ExternalApiError(_) => UPSTREAM_UNAVAILABLE_MESSAGE.to_string(),
            AppError::DataNotFound(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::DataNotFound(msg) => write!(f, "Data not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        match self.root() {
            AppError::ExternalApiError(_) => tracing::error!("External API error: {}", self),
            AppError::DataNotFound(_) => tracing::warn!("Upstream data missing: {}", self),
            _ => tracing::error!("Internal error: {}", self),
        }

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}
