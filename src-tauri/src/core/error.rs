//! QuranCaption Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::serialization::SerdeError;
use super::timeline::EditRejection;
use super::{AssetId, ProjectId};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Project Errors
    // =========================================================================
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Project file corrupted: {0}")]
    ProjectCorrupted(String),

    #[error("Failed to save project: {0}")]
    ProjectSaveFailed(String),

    #[error("No project open")]
    NoProjectOpen,

    // =========================================================================
    // Asset Errors
    // =========================================================================
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Unsupported asset format: {0}")]
    UnsupportedAssetFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Duration probe failed: {0}")]
    ProbeFailed(String),

    // =========================================================================
    // Timeline Errors
    // =========================================================================
    #[error("Edit refused: {0}")]
    EditRefused(#[from] EditRejection),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeError),

    // =========================================================================
    // Export Errors
    // =========================================================================
    #[error("Export cancelled")]
    Cancelled,

    #[error("Export failed: {0}")]
    ExportFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether the error is a refused edit rather than a failure
    pub fn is_edit_refusal(&self) -> bool {
        matches!(self, CoreError::EditRefused(_))
    }
}
