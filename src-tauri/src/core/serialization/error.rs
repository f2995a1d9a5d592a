//! Serialization error types.

use thiserror::Error;

/// Errors raised while turning object graphs into tagged trees and back
#[derive(Error, Debug)]
pub enum SerdeError {
    #[error("Unknown type tag '{tag}' at {path}")]
    UnknownTag { tag: String, path: String },

    #[error("Type tag '{tag}' at {path} builds {found}, expected {expected}")]
    TypeMismatch {
        tag: String,
        path: String,
        expected: String,
        found: String,
    },

    #[error("Missing field '{field}' at {path}")]
    MissingField { field: String, path: String },

    #[error("Invalid field '{field}' at {path}: {message}")]
    InvalidField {
        field: String,
        path: String,
        message: String,
    },

    #[error("Expected an object at {path}, found {found}")]
    ExpectedObject { path: String, found: &'static str },

    #[error("Invalid date '{value}' at {path}")]
    InvalidDate { value: String, path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization result type
pub type SerdeResult<T> = Result<T, SerdeError>;

impl SerdeError {
    pub(crate) fn invalid(field: &str, path: &str, message: impl Into<String>) -> Self {
        SerdeError::InvalidField {
            field: field.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: &str, path: &str) -> Self {
        SerdeError::MissingField {
            field: field.to_string(),
            path: path.to_string(),
        }
    }
}

/// Human-readable JSON kind, used in error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
