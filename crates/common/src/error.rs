//! Error types shared across Motionx crates.

use std::path::PathBuf;

/// Top-level error type for Motionx operations.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("Could not open {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Could not create the output video file {path}: {message}")]
    Create { path: PathBuf, message: String },

    #[error("Frame dimensions differ: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("{message}")]
    OffsetTooLarge { message: String },

    #[error("Delay buffer underflow: popped with {len} of {capacity} frame(s) buffered")]
    Underflow { len: usize, capacity: usize },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MotionError.
pub type MotionResult<T> = Result<T, MotionError>;

impl MotionError {
    pub fn open(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn create(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Create {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error was raised before any frame was processed
    /// (source/sink setup or offset validation).
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Open { .. } | Self::Create { .. } | Self::OffsetTooLarge { .. }
        )
    }
}
