//! Run clock and throughput utilities.
//!
//! Every extraction run is anchored to a monotonic epoch recorded when the
//! pipeline starts. The clock also keeps the wall-clock start time so run
//! reports can be correlated with other logs.

use std::time::Instant;

/// A run clock that provides monotonic elapsed time relative to
/// a fixed epoch (the moment the run started).
#[derive(Debug, Clone)]
pub struct RunClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl RunClock {
    /// Create a new run clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Frames processed per second of wall time so far.
    pub fn throughput(&self, frames: u64) -> f64 {
        rate(frames, self.elapsed_secs())
    }

    /// Estimated seconds remaining, given progress in `[0.0, 1.0]`.
    pub fn eta_secs(&self, progress: f64) -> f64 {
        let elapsed = self.elapsed_secs();
        if progress <= 0.0 {
            return 0.0;
        }
        ((elapsed / progress.min(1.0)) - elapsed).max(0.0)
    }
}

/// Frames per second for a frame count over a duration.
pub fn rate(frames: u64, secs: f64) -> f64 {
    if secs <= 0.0 {
        return 0.0;
    }
    frames as f64 / secs
}
