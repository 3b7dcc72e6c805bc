//! Reference frame selection.
//!
//! A positive delay compares each frame with the one `delay` frames earlier,
//! using a [`DelayBuffer`]. A delay of zero compares every frame, the first
//! one included, with a snapshot of the first frame of the stream.

use motionx_frame_model::Frame;

use crate::delay_buffer::DelayBuffer;
use crate::error::ProcessingResult;

/// Supplies the reference for each incoming frame.
#[derive(Debug)]
pub enum ReferenceFrames {
    /// Compare against the first frame ever seen.
    FirstFrame { snapshot: Option<Frame> },
    /// Compare against the frame `delay` steps earlier.
    Delayed(DelayBuffer),
}

impl ReferenceFrames {
    pub fn for_delay(delay: usize) -> Self {
        if delay == 0 {
            Self::FirstFrame { snapshot: None }
        } else {
            Self::Delayed(DelayBuffer::new(delay))
        }
    }

    /// Feed the next frame of the stream.
    ///
    /// When a reference is available, `compare(&current, &reference)` runs
    /// and its result is returned. While a delay buffer is still filling the
    /// frame is stored and `Ok(None)` is returned.
    pub fn advance<T>(
        &mut self,
        current: Frame,
        compare: impl FnOnce(&Frame, &Frame) -> ProcessingResult<T>,
    ) -> ProcessingResult<Option<T>> {
        match self {
            Self::FirstFrame { snapshot } => {
                let reference = snapshot.get_or_insert_with(|| current.clone());
                compare(&current, reference).map(Some)
            }
            Self::Delayed(buffer) => {
                if !buffer.is_primed() {
                    buffer.push(current);
                    return Ok(None);
                }
                let reference = buffer.pop_oldest()?;
                let output = compare(&current, &reference)?;
                buffer.push(current);
                Ok(Some(output))
            }
        }
    }

    /// Frames currently held back as references.
    pub fn buffered(&self) -> usize {
        match self {
            Self::FirstFrame { snapshot } => usize::from(snapshot.is_some()),
            Self::Delayed(buffer) => buffer.len(),
        }
    }

    pub fn delay(&self) -> usize {
        match self {
            Self::FirstFrame { .. } => 0,
            Self::Delayed(buffer) => buffer.capacity(),
        }
    }
}
