//! Frame differencing.
//!
//! The current frame is averaged with the negative of its reference:
//! `out = round(0.5 * current + 0.5 * (255 - reference))`, which is
//! `127.5 + (current - reference) / 2`. Unchanged pixels land on mid-grey
//! and motion pushes the pixel away from grey in proportion to the signed
//! channel difference.

use motionx_frame_model::Frame;

use crate::error::{ProcessingError, ProcessingResult};

/// Level of a pixel whose current and reference samples are equal.
pub const NO_MOTION_LEVEL: u8 = 128;

/// Stateless differ between a frame and its reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDiffer;

impl FrameDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Build the difference frame for `current` against `reference`.
    ///
    /// Both frames must have the same shape. The result carries the index of
    /// `current`.
    pub fn diff(&self, current: &Frame, reference: &Frame) -> ProcessingResult<Frame> {
        ProcessingError::ensure_same_shape(current.shape(), reference.shape())?;

        let data = current
            .data()
            .iter()
            .zip(reference.data())
            .map(|(&c, &r)| blend_inverted(c, r))
            .collect();

        let frame = Frame::from_shape(current.shape(), data)?;
        Ok(frame.with_index(current.index()))
    }
}

/// Average of `current` and the inverse of `reference`, halves rounded up.
#[inline]
fn blend_inverted(current: u8, reference: u8) -> u8 {
    let inverted = 255 - reference as u16;
    ((current as u16 + inverted + 1) >> 1) as u8
}
