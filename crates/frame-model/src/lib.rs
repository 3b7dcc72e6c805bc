//! Motionx Frame Model
//!
//! Defines the core data contracts shared by the processing and render crates:
//! - **Frames:** Immutable pixel grids with a fixed channel layout
//! - **Video info:** Source properties queried once before a run
//! - **Offsets:** The frame delay between a frame and its reference
//!
//! This crate is pure data; it performs no I/O.

pub mod frame;
pub mod offset;
pub mod video;

pub use frame::*;
pub use offset::*;
pub use video::*;
