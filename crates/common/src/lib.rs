//! Motionx Common Utilities
//!
//! Shared infrastructure for all Motionx crates:
//! - Error types and result aliases
//! - Run clock for elapsed time and throughput
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
