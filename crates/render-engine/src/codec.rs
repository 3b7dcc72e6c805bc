//! Output video codecs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Codec used to encode the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// H.264 / AVC, tagged `avc1`.
    #[default]
    H264,
    /// H.265 / HEVC, tagged `hvc1`.
    H265,
    /// VP9, tagged `vp09`.
    Vp9,
}

impl VideoCodec {
    /// Four-character code written into the container.
    pub fn fourcc(self) -> &'static str {
        match self {
            VideoCodec::H264 => "avc1",
            VideoCodec::H265 => "hvc1",
            VideoCodec::Vp9 => "vp09",
        }
    }

    /// ffmpeg encoder name.
    pub fn encoder(self) -> &'static str {
        match self {
            VideoCodec::H264 => "libx264",
            VideoCodec::H265 => "libx265",
            VideoCodec::Vp9 => "libvpx-vp9",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h264" | "avc" | "avc1" => Ok(VideoCodec::H264),
            "h265" | "hevc" | "hvc1" => Ok(VideoCodec::H265),
            "vp9" | "vp09" => Ok(VideoCodec::Vp9),
            other => Err(format!("Unknown codec: {other}. Use: h264, h265, vp9")),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
            VideoCodec::Vp9 => "vp9",
        };
        f.write_str(name)
    }
}
