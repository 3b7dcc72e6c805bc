//! Motionx Processing Core
//!
//! Per-frame building blocks of motion extraction:
//! - **Tone curve:** Precomputed gamma lookup table for difference frames
//! - **Frame differ:** Blends a frame with the inverse of its reference
//! - **Overlay compositor:** Thresholds a difference into a motion mask and
//!   merges it onto the source frame
//! - **Delay buffer:** Bounded FIFO that supplies time-delayed references
//!
//! Everything here works on in-memory frames. Decoding and encoding live in
//! the render engine.

pub mod delay_buffer;
pub mod error;
pub mod frame_diff;
pub mod overlay;
pub mod reference;
pub mod tone_curve;

pub use delay_buffer::DelayBuffer;
pub use error::{ProcessingError, ProcessingResult};
pub use frame_diff::FrameDiffer;
pub use overlay::OverlayCompositor;
pub use reference::ReferenceFrames;
pub use tone_curve::ToneCurve;
