//! Source video properties.

use serde::{Deserialize, Serialize};

use crate::frame::{FrameShape, PixelFormat};

/// Properties of a source video, queried once before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Frames per second.
    pub fps: f64,

    /// Total number of frames in the source.
    pub frame_count: u64,

    /// Source codec name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

impl VideoInfo {
    pub fn new(width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_count,
            codec: None,
        }
    }

    /// Duration in seconds derived from frame count and rate.
    pub fn duration_secs(&self) -> f64 {
        if self.fps <= 0.0 {
            return 0.0;
        }
        self.frame_count as f64 / self.fps
    }

    /// Shape of the decoded colour frames.
    pub fn frame_shape(&self) -> FrameShape {
        FrameShape::new(self.width, self.height, PixelFormat::Bgr24)
    }
}
