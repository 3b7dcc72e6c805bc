//! Processing errors.

use motionx_common::error::MotionError;
use motionx_frame_model::{FrameError, FrameShape};

/// Errors raised by the per-frame processing stages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("Frame dimensions differ: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: FrameShape,
        actual: FrameShape,
    },

    #[error("Delay buffer underflow: popped with {len} of {capacity} frame(s) buffered")]
    Underflow { len: usize, capacity: usize },

    #[error("Gamma must be a positive finite number (got {gamma})")]
    InvalidGamma { gamma: f64 },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

impl ProcessingError {
    /// Fail with `DimensionMismatch` unless both shapes are identical.
    pub fn ensure_same_shape(expected: FrameShape, actual: FrameShape) -> ProcessingResult<()> {
        if expected != actual {
            return Err(ProcessingError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

impl From<ProcessingError> for MotionError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::DimensionMismatch { expected, actual } => {
                MotionError::DimensionMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                }
            }
            ProcessingError::Underflow { len, capacity } => {
                MotionError::Underflow { len, capacity }
            }
            other => MotionError::processing(other.to_string()),
        }
    }
}
