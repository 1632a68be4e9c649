use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// A single violated field, reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while turning pasted markup into a recipe draft
#[derive(Error, Debug)]
pub enum ParsingError {
    /// A selector could not be compiled, so the document cannot be queried
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Errors surfaced by the catalog's operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed or missing input
    #[error("{}", validation_message(.0))]
    Validation(Vec<FieldError>),

    /// Id does not have the expected shape
    #[error("Invalid {0} ID format")]
    InvalidId(&'static str),

    /// No record with the given id
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Bad credentials or missing/invalid bearer token
    #[error("{0}")]
    Auth(String),

    /// Authenticated, but the role does not allow the operation
    #[error("{0}")]
    Forbidden(String),

    /// Pasted markup could not be loaded
    #[error("HTML parsing failed: {0}")]
    Parsing(#[from] ParsingError),

    /// Snapshot file could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Shorthand for a validation failure on one field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) | CatalogError::InvalidId(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Auth(_) => StatusCode::UNAUTHORIZED,
            CatalogError::Forbidden(_) => StatusCode::FORBIDDEN,
            CatalogError::Parsing(_)
            | CatalogError::Storage(_)
            | CatalogError::Config(_)
            | CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn validation_message(errors: &[FieldError]) -> String {
    match errors {
        [single] => single.message.clone(),
        _ => format!(
            "Validation failed: {}",
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            CatalogError::Validation(errors) => {
                let fields: Map<String, Value> = errors
                    .iter()
                    .map(|e| (e.field.clone(), Value::String(e.message.clone())))
                    .collect();
                json!({ "message": self.to_string(), "errors": fields })
            }
            CatalogError::Storage(_) | CatalogError::Config(_) | CatalogError::Internal(_) => {
                error!("{}", self);
                json!({ "message": "Server error" })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_validation_error_uses_field_message() {
        let err = CatalogError::invalid("email", "User already exists");
        assert_eq!(err.to_string(), "User already exists");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_multiple_validation_errors_are_joined() {
        let err = CatalogError::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("image", "Image is required"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: Title is required, Image is required"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CatalogError::InvalidId("recipe").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CatalogError::NotFound("Recipe").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CatalogError::Auth("nope".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CatalogError::Forbidden("nope".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        let parsing = CatalogError::from(ParsingError::InvalidSelector {
            selector: "[".to_string(),
            message: "unexpected end".to_string(),
        });
        assert_eq!(parsing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(parsing.to_string().starts_with("HTML parsing failed"));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            CatalogError::NotFound("Recipe").to_string(),
            "Recipe not found"
        );
        assert_eq!(
            CatalogError::InvalidId("recipe").to_string(),
            "Invalid recipe ID format"
        );
    }
}
