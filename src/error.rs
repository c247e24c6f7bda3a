//! Error handling for the looper editor
//!
//! Validation failures are collected into [`ValidationErrors`] so a rejected
//! settings commit can show every problem at once.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{LayerId, SegmentId};

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Main error type for editor operations
#[derive(Error, Debug)]
pub enum EditorError {
    // Schema Errors
    #[error("Unknown device kind: {kind}")]
    NotFound { kind: String },

    #[error("Invalid schema for '{kind}': {reason}")]
    InvalidSchema { kind: String, reason: String },

    // Field Errors
    #[error("Field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: String, value: String },

    // Cardinality Errors
    #[error("Too few {what}: at least {min_count} required")]
    TooFew { what: String, min_count: i64 },

    #[error("Too many {what}: at most {max_count} allowed")]
    TooMany { what: String, max_count: i64 },

    // Segment Errors
    #[error("Could not find segment {segment} to update for layer {layer}")]
    UpdateTargetMissing { layer: LayerId, segment: SegmentId },

    #[error("Invalid segment: start={start}, stop={stop}")]
    InvalidSegment { start: f64, stop: f64 },

    #[error("Device kind '{kind}' does not host {polarity} segments")]
    UnsupportedPolarity { kind: String, polarity: String },

    // Layer Errors
    #[error("Unknown layer: {layer}")]
    UnknownLayer { layer: LayerId },

    #[error("Layer {layer} has no device kind configured")]
    Unconfigured { layer: LayerId },

    #[error("Id {id} is out of range")]
    IdOutOfRange { id: u64 },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // Project Errors
    #[error("Project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    #[error("Invalid project name: '{name}'")]
    InvalidProjectName { name: String },

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EditorError::NotFound { .. } => "NOT_FOUND",
            EditorError::InvalidSchema { .. } => "INVALID_SCHEMA",
            EditorError::InvalidNumber { .. } => "INVALID_NUMBER",
            EditorError::TooFew { .. } => "TOO_FEW",
            EditorError::TooMany { .. } => "TOO_MANY",
            EditorError::UpdateTargetMissing { .. } => "UPDATE_TARGET_MISSING",
            EditorError::InvalidSegment { .. } => "INVALID_SEGMENT",
            EditorError::UnsupportedPolarity { .. } => "UNSUPPORTED_POLARITY",
            EditorError::UnknownLayer { .. } => "UNKNOWN_LAYER",
            EditorError::Unconfigured { .. } => "UNCONFIGURED",
            EditorError::IdOutOfRange { .. } => "ID_OUT_OF_RANGE",
            EditorError::Validation(_) => "VALIDATION",
            EditorError::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            EditorError::InvalidProjectName { .. } => "INVALID_PROJECT_NAME",
            EditorError::Config { .. } => "CONFIG",
            EditorError::Io(_) => "IO_ERROR",
            EditorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can fix this error by editing their input and retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EditorError::InvalidNumber { .. }
                | EditorError::TooFew { .. }
                | EditorError::TooMany { .. }
                | EditorError::UpdateTargetMissing { .. }
                | EditorError::InvalidSegment { .. }
                | EditorError::UnsupportedPolarity { .. }
                | EditorError::Unconfigured { .. }
                | EditorError::Validation(_)
                | EditorError::ProjectNotFound { .. }
                | EditorError::InvalidProjectName { .. }
        )
    }
}

/// Every error collected while validating one submission, in detection order.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<EditorError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: EditorError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditorError> {
        self.errors.iter()
    }

    /// Error codes in detection order
    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(EditorError::error_code).collect()
    }

    pub fn into_inner(self) -> Vec<EditorError> {
        self.errors
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<EditorError> for ValidationErrors {
    fn from(error: EditorError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<ValidationErrors> for EditorError {
    fn from(errors: ValidationErrors) -> Self {
        EditorError::Validation(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
