//! Frame and pixel layout types.
//!
//! Pixel data is stored row-major, channels interleaved, 8 bits per channel.
//! Colour frames use B-G-R channel order, which is what the decoder emits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Three 8-bit channels in blue, green, red order.
    Bgr24,
    /// One 8-bit luminance channel.
    Gray8,
}

impl PixelFormat {
    /// Number of interleaved channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    /// The format name understood by ffmpeg's `-pix_fmt`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Gray8 => "gray",
        }
    }
}

/// Dimensions and channel layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl FrameShape {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Number of pixels in a frame of this shape.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of bytes in a frame of this shape.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.format.channels()
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}",
            self.width,
            self.height,
            self.format.channels()
        )
    }
}

/// A decoded video frame.
///
/// Frames are immutable once built: there is no way to reach the pixel
/// buffer mutably. Transformations either build a new frame or consume
/// an owned one (see [`Frame::map_samples`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    shape: FrameShape,
    data: Vec<u8>,
    index: u64,
}

impl Frame {
    /// Build a frame from raw interleaved samples.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        Self::from_shape(FrameShape::new(width, height, format), data)
    }

    /// Build a frame of a known shape from raw interleaved samples.
    pub fn from_shape(shape: FrameShape, data: Vec<u8>) -> Result<Self, FrameError> {
        if shape.width == 0 || shape.height == 0 {
            return Err(FrameError::ZeroDimension {
                width: shape.width,
                height: shape.height,
            });
        }
        let expected = shape.byte_len();
        if data.len() != expected {
            return Err(FrameError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            data,
            index: 0,
        })
    }

    /// A frame with every sample set to `value`.
    pub fn filled(
        width: u32,
        height: u32,
        format: PixelFormat,
        value: u8,
    ) -> Result<Self, FrameError> {
        let shape = FrameShape::new(width, height, format);
        Self::from_shape(shape, vec![value; shape.byte_len()])
    }

    /// Tag the frame with its position in the source stream.
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    pub fn width(&self) -> u32 {
        self.shape.width
    }

    pub fn height(&self) -> u32 {
        self.shape.height
    }

    pub fn format(&self) -> PixelFormat {
        self.shape.format
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Position of the frame in its source stream.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pixel_count(&self) -> usize {
        self.shape.pixel_count()
    }

    /// Raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Samples of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.shape.width || y >= self.shape.height {
            return None;
        }
        let channels = self.shape.format.channels();
        let start = (y as usize * self.shape.width as usize + x as usize) * channels;
        Some(&self.data[start..start + channels])
    }

    /// Consume the frame, remapping every sample independently.
    pub fn map_samples(mut self, f: impl Fn(u8) -> u8) -> Self {
        for sample in &mut self.data {
            *sample = f(*sample);
        }
        self
    }

    /// Consume the frame and return its sample buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Errors raised when constructing frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Frame data has {actual} byte(s), expected {expected}")]
    DataLength { expected: usize, actual: usize },
}
