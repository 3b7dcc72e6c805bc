//! Frame delay offsets.
//!
//! An offset is requested either as a frame count or as a number of seconds,
//! and resolved against the source's frame rate and length before a run.

use serde::{Deserialize, Serialize};

use crate::video::VideoInfo;

/// How the user asked for the delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetSpec {
    /// Delay by a number of frames.
    Frames(u64),
    /// Delay by a number of seconds, converted with the source frame rate.
    Seconds(f64),
}

/// A resolved delay, in frames.
///
/// Zero means every frame is compared against the first frame of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Offset {
    frames: u64,
}

impl Offset {
    pub fn from_frames(frames: u64) -> Self {
        Self { frames }
    }

    /// Seconds times frame rate, rounded toward zero.
    pub fn from_secs(secs: f64, fps: f64) -> Result<Self, OffsetError> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(OffsetError::InvalidSeconds { secs });
        }
        let frames = (secs * fps.max(0.0)).trunc();
        Ok(Self {
            frames: frames as u64,
        })
    }

    /// Resolve a requested offset against a source.
    ///
    /// The delay must be strictly smaller than the source frame count,
    /// otherwise no frame would ever be compared.
    pub fn resolve(spec: OffsetSpec, info: &VideoInfo) -> Result<Self, OffsetError> {
        let offset = match spec {
            OffsetSpec::Frames(frames) => Self::from_frames(frames),
            OffsetSpec::Seconds(secs) => Self::from_secs(secs, info.fps)?,
        };

        if offset.frames >= info.frame_count {
            return Err(match spec {
                OffsetSpec::Frames(requested) => OffsetError::FramesTooLarge {
                    requested,
                    available: info.frame_count,
                },
                OffsetSpec::Seconds(requested) => OffsetError::SecondsTooLarge {
                    requested,
                    available: info.duration_secs().trunc() as u64,
                },
            });
        }

        Ok(offset)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The offset as a buffer capacity.
    pub fn as_delay(&self) -> usize {
        self.frames as usize
    }

    /// Whether this offset selects the fixed first-frame reference.
    pub fn is_fixed_reference(&self) -> bool {
        self.frames == 0
    }
}

/// Errors raised when resolving an offset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OffsetError {
    #[error("Input video only has {available} frame(s). Cannot offset by {requested} frame(s).")]
    FramesTooLarge { requested: u64, available: u64 },

    #[error(
        "Input video is only {available} second(s) long. Cannot offset by {requested} second(s)."
    )]
    SecondsTooLarge { requested: f64, available: u64 },

    #[error("Seconds must be a non-negative number (got {secs}).")]
    InvalidSeconds { secs: f64 },
}

impl OffsetError {
    /// Whether the error is a length violation rather than a malformed request.
    pub fn is_too_large(&self) -> bool {
        matches!(
            self,
            OffsetError::FramesTooLarge { .. } | OffsetError::SecondsTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ten_frames_at_ten_fps() -> VideoInfo {
        VideoInfo::new(4, 4, 10.0, 10)
    }

    #[test]
    fn test_one_second_equal_to_length_is_rejected() {
        let err = Offset::resolve(OffsetSpec::Seconds(1.0), &ten_frames_at_ten_fps()).unwrap_err();
        assert!(err.is_too_large());
        assert_eq!(
            err.to_string(),
            "Input video is only 1 second(s) long. Cannot offset by 1 second(s)."
        );
    }

    #[test]
    fn test_half_second_truncates_to_five_frames() {
        let offset = Offset::resolve(OffsetSpec::Seconds(0.5), &ten_frames_at_ten_fps()).unwrap();
        assert_eq!(offset.frames(), 5);
        assert_eq!(offset.as_delay(), 5);
    }

    #[test]
    fn test_seconds_round_toward_zero() {
        let offset = Offset::from_secs(0.55, 10.0).unwrap();
        assert_eq!(offset.frames(), 5);
    }

    #[test]
    fn test_frame_count_offset_is_rejected() {
        let err = Offset::resolve(OffsetSpec::Frames(10), &ten_frames_at_ten_fps()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input video only has 10 frame(s). Cannot offset by 10 frame(s)."
        );
    }

    #[test]
    fn test_zero_offset_selects_fixed_reference() {
        let offset = Offset::resolve(OffsetSpec::Frames(0), &ten_frames_at_ten_fps()).unwrap();
        assert!(offset.is_fixed_reference());
    }

    #[test]
    fn test_negative_seconds_are_invalid() {
        let err = Offset::resolve(OffsetSpec::Seconds(-1.0), &ten_frames_at_ten_fps()).unwrap_err();
        assert!(matches!(err, OffsetError::InvalidSeconds { .. }));
        assert!(!err.is_too_large());
    }

    proptest! {
        #[test]
        fn frame_offsets_below_length_resolve_unchanged(count in 1u64..10_000, pick in 0u64..10_000) {
            let requested = pick % count;
            let info = VideoInfo::new(2, 2, 30.0, count);
            let offset = Offset::resolve(OffsetSpec::Frames(requested), &info).unwrap();
            prop_assert_eq!(offset.frames(), requested);
        }

        #[test]
        fn resolved_offsets_never_reach_frame_count(count in 0u64..500, secs in 0.0f64..100.0, fps in 1.0f64..120.0) {
            let info = VideoInfo::new(2, 2, fps, count);
            if let Ok(offset) = Offset::resolve(OffsetSpec::Seconds(secs), &info) {
                prop_assert!(offset.frames() < count);
                prop_assert!(offset.frames() as f64 <= secs * fps);
            }
        }
    }
}
