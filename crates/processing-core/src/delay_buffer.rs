//! Bounded FIFO of frames supplying time-delayed references.

use std::collections::VecDeque;

use motionx_frame_model::Frame;

use crate::error::{ProcessingError, ProcessingResult};

/// Holds the last `delay` frames so each new frame can be compared against
/// the one `delay` steps earlier.
///
/// The buffer owns every frame it holds until [`DelayBuffer::pop_oldest`]
/// hands it back.
#[derive(Debug)]
pub struct DelayBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl DelayBuffer {
    /// Create an empty buffer that primes after `delay` frames.
    pub fn new(delay: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(delay + 1),
            capacity: delay,
        }
    }

    /// Append a frame at the back of the queue.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Whether the buffer holds exactly `delay` frames.
    pub fn is_primed(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// Remove and return the oldest frame.
    ///
    /// Fails with [`ProcessingError::Underflow`] unless the buffer is primed.
    pub fn pop_oldest(&mut self) -> ProcessingResult<Frame> {
        if !self.is_primed() {
            return Err(self.underflow());
        }
        self.frames.pop_front().ok_or_else(|| self.underflow())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn underflow(&self) -> ProcessingError {
        ProcessingError::Underflow {
            len: self.frames.len(),
            capacity: self.capacity,
        }
    }
}
