//! Motion overlay compositing.
//!
//! A difference frame is reduced to luminance, thresholded into a binary
//! motion mask, softened with a 3×3 box blur and OR-ed onto the source
//! frame, whitening the regions that moved.

use image::{GrayImage, Luma};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::box_filter;
use motionx_frame_model::{Frame, FrameShape, PixelFormat};

use crate::error::{ProcessingError, ProcessingResult};

/// Luminance at or above which a difference pixel counts as motion.
///
/// Sits just above the no-motion level of 128 so that rounding noise in
/// static regions stays black.
pub const MOTION_THRESHOLD: u8 = 129;

/// Side length of the box blur applied to the mask.
pub const BLUR_KERNEL_SIZE: u32 = 3;

// BT.601 luma weights in 14-bit fixed point (R, G, B).
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// Merges a thresholded motion mask onto the source frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayCompositor;

impl OverlayCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Composite the motion in `diff` onto `original`.
    pub fn overlay(&self, original: &Frame, diff: &Frame) -> ProcessingResult<Frame> {
        ProcessingError::ensure_same_shape(original.shape(), diff.shape())?;

        let mask = self.blurred_mask(diff);
        let channels = original.format().channels();

        let data = original
            .data()
            .chunks_exact(channels)
            .zip(mask.as_raw())
            .flat_map(|(pixel, &m)| pixel.iter().map(move |&sample| sample | m))
            .collect();

        let frame = Frame::from_shape(original.shape(), data)?;
        Ok(frame.with_index(original.index()))
    }

    /// The blurred single-channel motion mask of a difference frame.
    pub fn motion_mask(&self, diff: &Frame) -> ProcessingResult<Frame> {
        let mask = self.blurred_mask(diff);
        let shape = FrameShape::new(diff.width(), diff.height(), PixelFormat::Gray8);
        Ok(Frame::from_shape(shape, mask.into_raw())?.with_index(diff.index()))
    }

    fn blurred_mask(&self, diff: &Frame) -> GrayImage {
        // `Binary` keeps values strictly above the level.
        let binary = threshold(&luma(diff), MOTION_THRESHOLD - 1, ThresholdType::Binary);
        let radius = BLUR_KERNEL_SIZE / 2;
        box_filter(&binary, radius, radius)
    }
}

/// Per-pixel BT.601 luminance of a frame.
fn luma(frame: &Frame) -> GrayImage {
    let (width, height) = (frame.width(), frame.height());
    let channels = frame.format().channels();
    let data = frame.data();
    GrayImage::from_fn(width, height, |x, y| {
        let i = (y as usize * width as usize + x as usize) * channels;
        match frame.format() {
            PixelFormat::Gray8 => Luma([data[i]]),
            PixelFormat::Bgr24 => Luma([bt601(data[i], data[i + 1], data[i + 2])]),
        }
    })
}

fn bt601(b: u8, g: u8, r: u8) -> u8 {
    let weighted =
        b as u32 * LUMA_B + g as u32 * LUMA_G + r as u32 * LUMA_R + (1 << (LUMA_SHIFT - 1));
    (weighted >> LUMA_SHIFT) as u8
}
