//! Motionx Render Engine
//!
//! Drives motion extraction frame by frame, from a decoded source to an
//! encoded sink.
//!
//! # Pipeline Architecture
//!
//! ```text
//! input.mp4 ── ffmpeg decode (bgr24) ──┐
//!                                      ▼
//!                              Reference frames
//!                      (delay buffer | first frame)
//!                                      │
//!                                      ├── Frame differ
//!                                      │
//!                          ┌───────────┴───────────┐
//!                     Tone curve            Overlay compositor
//!                          └───────────┬───────────┘
//!                                      ▼
//!                          ffmpeg encode (H.264)
//!                                      │
//!                                      ▼
//!                                 output.mp4
//! ```

pub mod codec;
pub mod extract;
pub mod ffmpeg;
pub mod media;
pub mod pipeline;

pub use codec::VideoCodec;
pub use extract::*;
pub use media::{FrameSink, FrameSource, MemorySink, MemorySource};
pub use pipeline::*;
