// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the cinematic engine.

use thiserror::Error;

/// Cinematic engine errors
#[derive(Debug, Error)]
pub enum CinematicError {
    /// Sequence time scale must be strictly positive
    #[error("Invalid time scale {0}: must be greater than zero")]
    InvalidTimeScale(f32),

    /// A shot was authored with a negative timing value
    #[error("Shot '{shot}' has negative {field}: {value}")]
    NegativeTiming {
        /// Shot name
        shot: String,
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f32,
    },

    /// The scene provider does not know the requested scene
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// A spawn anchor id could not be resolved
    #[error("Spawn anchor not found: {0}")]
    AnchorNotFound(String),

    /// A user callback reported a failure
    #[error("Callback failed: {0}")]
    Callback(#[from] CallbackError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for cinematic operations
pub type Result<T> = std::result::Result<T, CinematicError>;

/// Failure reported by a user-supplied callback
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Result type returned by finish callbacks and bridges
pub type CallbackResult = std::result::Result<(), CallbackError>;
