//! Media source and sink contracts.
//!
//! The pipeline only sees decoded frames. Opening containers and choosing
//! codecs is the job of the implementations (see [`crate::ffmpeg`]).

use std::collections::VecDeque;

use motionx_common::error::{MotionError, MotionResult};
use motionx_frame_model::{Frame, VideoInfo};

/// A stream of decoded frames.
pub trait FrameSource {
    /// Source properties, fixed for the lifetime of the source.
    fn info(&self) -> &VideoInfo;

    /// Read the next frame. `Ok(None)` marks the end of the stream.
    fn read_frame(&mut self) -> MotionResult<Option<Frame>>;
}

/// A consumer of processed frames.
pub trait FrameSink {
    /// Append a frame to the output.
    fn write_frame(&mut self, frame: &Frame) -> MotionResult<()>;

    /// Flush and close the output. No frame may be written afterwards.
    fn finish(&mut self) -> MotionResult<()> {
        Ok(())
    }
}

/// Frames held in memory.
#[derive(Debug)]
pub struct MemorySource {
    info: VideoInfo,
    frames: VecDeque<Frame>,
    next_index: u64,
}

impl MemorySource {
    /// Build a source from frames of identical shape.
    pub fn from_frames(frames: Vec<Frame>, fps: f64) -> MotionResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| MotionError::decode("Memory source needs at least one frame"))?;
        let info = VideoInfo::new(first.width(), first.height(), fps, frames.len() as u64);
        Ok(Self::with_info(info, frames))
    }

    /// Build a source with explicit properties. Frames are not checked
    /// against `info`.
    pub fn with_info(info: VideoInfo, frames: Vec<Frame>) -> Self {
        Self {
            info,
            frames: frames.into(),
            next_index: 0,
        }
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> MotionResult<Option<Frame>> {
        let Some(frame) = self.frames.pop_front() else {
            return Ok(None);
        };
        let frame = frame.with_index(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Collects written frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> MotionResult<()> {
        if self.finished {
            return Err(MotionError::encode("Sink already finished"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> MotionResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionx_frame_model::PixelFormat;

    #[test]
    fn test_memory_source_numbers_frames() {
        let frames = vec![Frame::filled(2, 2, PixelFormat::Bgr24, 0).unwrap(); 3];
        let mut source = MemorySource::from_frames(frames, 24.0).unwrap();
        assert_eq!(source.info().frame_count, 3);
        assert_eq!(source.info().width, 2);

        let indices: Vec<u64> = std::iter::from_fn(|| source.read_frame().unwrap())
            .map(|f| f.index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_memory_source_requires_frames() {
        assert!(MemorySource::from_frames(Vec::new(), 30.0).is_err());
    }

    #[test]
    fn test_memory_sink_rejects_writes_after_finish() {
        let frame = Frame::filled(1, 1, PixelFormat::Bgr24, 9).unwrap();
        let mut sink = MemorySink::new();
        sink.write_frame(&frame).unwrap();
        sink.finish().unwrap();
        assert!(sink.write_frame(&frame).is_err());
        assert_eq!(sink.frames().len(), 1);
        assert!(sink.is_finished());
    }
}
