use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Per-offering failure classes. Serialized into the run report so the sink
/// can tell skipped offerings apart by reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    NoMatchingCategory,
    DocumentNotFound,
    OutputCollision,
    MissingIdentity,
    Internal,
}

/// Which half of a category pair a selection or document refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Resume => write!(f, "resume"),
            DocumentKind::CoverLetter => write!(f, "cover letter"),
        }
    }
}

/// Errors raised while matching a single offering.
///
/// Everything except `InvalidLibrary` is scoped to one offering: the run driver
/// records it and moves on. `InvalidLibrary` is a configuration error and
/// aborts the run.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("no {0} category overlaps the offering and no fallback is configured")]
    NoMatchingCategory(DocumentKind),

    #[error("source document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("output already exists: {}", .0.display())]
    OutputCollision(PathBuf),

    #[error("offering is missing its {0}")]
    MissingIdentity(&'static str),

    #[error("cover letter template is not valid UTF-8: {}", .0.display())]
    TemplateEncoding(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid category library: {0}")]
    InvalidLibrary(String),
}

impl MatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::InsufficientData(_) => ErrorKind::InsufficientData,
            MatchError::NoMatchingCategory(_) => ErrorKind::NoMatchingCategory,
            MatchError::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            MatchError::OutputCollision(_) => ErrorKind::OutputCollision,
            MatchError::MissingIdentity(_) => ErrorKind::MissingIdentity,
            MatchError::TemplateEncoding(_)
            | MatchError::Io { .. }
            | MatchError::InvalidLibrary(_) => ErrorKind::Internal,
        }
    }

    /// Configuration errors are not attributable to offering data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MatchError::InvalidLibrary(_))
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err.kind() {
            ErrorKind::InsufficientData
            | ErrorKind::NoMatchingCategory
            | ErrorKind::MissingIdentity => AppError::UnprocessableEntity(err.to_string()),
            ErrorKind::DocumentNotFound => AppError::NotFound(err.to_string()),
            ErrorKind::OutputCollision => AppError::Conflict(err.to_string()),
            ErrorKind::Internal if err.is_fatal() => AppError::Configuration(err.to_string()),
            ErrorKind::Internal => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offering_errors_map_to_their_kind() {
        assert_eq!(
            MatchError::InsufficientData("x".into()).kind(),
            ErrorKind::InsufficientData
        );
        assert_eq!(
            MatchError::NoMatchingCategory(DocumentKind::Resume).kind(),
            ErrorKind::NoMatchingCategory
        );
        assert_eq!(
            MatchError::OutputCollision(PathBuf::from("a.txt")).kind(),
            ErrorKind::OutputCollision
        );
        assert_eq!(
            MatchError::MissingIdentity("company").kind(),
            ErrorKind::MissingIdentity
        );
    }

    #[test]
    fn test_io_and_encoding_are_internal_but_not_fatal() {
        let io = MatchError::io("x", std::io::Error::other("boom"));
        assert_eq!(io.kind(), ErrorKind::Internal);
        assert!(!io.is_fatal());
        assert!(!MatchError::TemplateEncoding(PathBuf::from("t")).is_fatal());
    }

    #[test]
    fn test_invalid_library_is_fatal() {
        assert!(MatchError::InvalidLibrary("empty".into()).is_fatal());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NoMatchingCategory).unwrap();
        assert_eq!(json, r#""no_matching_category""#);
    }

    #[test]
    fn test_collision_maps_to_conflict_response() {
        let app: AppError = MatchError::OutputCollision(PathBuf::from("a")).into();
        let response = app.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
