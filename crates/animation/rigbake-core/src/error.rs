//! Error types for composition, baking and conversion.

use serde::{Deserialize, Serialize};

/// Errors raised by rigbake-core.
///
/// Only fatal input problems surface here. Missing IK bones are also reported
/// through this type by `TwoBoneIkSolver::from_settings`, but the conversion
/// pipeline downgrades them to warnings and keeps going.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreError {
    /// A required input (clip path, output folder, ...) was not provided.
    #[error("Missing input: {what}")]
    MissingInput { what: String },

    /// A bone required by an IK chain is absent from the skeleton.
    #[error("Bone '{bone}' required by chain '{chain}' not found in skeleton")]
    MissingBone { chain: String, bone: String },

    /// A bone referenced a parent that has not been added yet.
    #[error("Parent bone '{parent}' of '{bone}' not found")]
    UnknownParent { bone: String, parent: String },

    /// Clip failed basic validation.
    #[error("Invalid clip '{clip}': {reason}")]
    InvalidClip { clip: String, reason: String },

    /// Skeleton document failed validation.
    #[error("Invalid skeleton: {reason}")]
    InvalidSkeleton { reason: String },

    /// No translator registered for the file extension.
    #[error("Unsupported asset format: {path}")]
    UnsupportedFormat { path: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// IO error
    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl CoreError {
    /// Whether a conversion may continue after this error.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingBone { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "input",
            Self::MissingBone { .. } => "configuration",
            Self::UnknownParent { .. } | Self::InvalidSkeleton { .. } => "skeleton",
            Self::InvalidClip { .. } => "validation",
            Self::UnsupportedFormat { .. } | Self::Serialization { .. } => "serialization",
            Self::Io { .. } => "io",
        }
    }

    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
