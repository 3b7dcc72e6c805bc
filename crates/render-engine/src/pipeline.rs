//! The frame-by-frame motion extraction loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use motionx_common::clock::RunClock;
use motionx_common::error::MotionResult;
use motionx_processing_core::{FrameDiffer, OverlayCompositor, ReferenceFrames, ToneCurve};
use serde::{Deserialize, Serialize};

use crate::media::{FrameSink, FrameSource};

/// How a difference frame becomes an output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Write the difference frame through the tone curve.
    #[default]
    ToneMapped,
    /// Whiten the moving regions of the source frame.
    Overlay,
}

impl CompositeMode {
    pub fn from_overlay_flag(overlay: bool) -> Self {
        if overlay {
            CompositeMode::Overlay
        } else {
            CompositeMode::ToneMapped
        }
    }
}

/// Settings for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Frames between a frame and its reference. Zero compares against the
    /// first frame.
    pub delay: usize,

    /// Composite step applied to each difference frame.
    pub mode: CompositeMode,
}

/// Stages of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Read,
    Buffer,
    Compare,
    Composite,
    Write,
    Done,
}

/// Progress callback invoked after every frame read.
pub type ProgressCallback = Box<dyn Fn(ExtractionProgress) + Send>;

/// Progress report for a run.
#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames pulled from the source so far.
    pub frames_read: u64,

    /// Frames written to the sink so far.
    pub frames_written: u64,

    /// Frames the source reported.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Stage the frame finished in.
    pub stage: PipelineStage,
}

/// Outcome of a completed or cancelled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub delay: usize,
    pub mode: CompositeMode,
    pub frames_read: u64,
    pub frames_written: u64,
    /// Frames consumed only to fill the delay buffer.
    pub frames_buffered: u64,
    pub cancelled: bool,
    pub started_at: String,
    pub elapsed_secs: f64,
    pub throughput_fps: f64,
}

/// Compares every source frame with its reference and writes the composite.
pub struct MotionExtractionPipeline {
    config: ExtractionConfig,
    tone_curve: ToneCurve,
    differ: FrameDiffer,
    compositor: OverlayCompositor,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressCallback>,
}

impl MotionExtractionPipeline {
    pub fn new(config: ExtractionConfig, tone_curve: ToneCurve) -> Self {
        Self {
            config,
            tone_curve,
            differ: FrameDiffer::new(),
            compositor: OverlayCompositor::new(),
            cancel: None,
            progress: None,
        }
    }

    /// Stop at the next frame boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run until the source is exhausted, a stage fails, or the run is
    /// cancelled.
    ///
    /// The sink is not finished here; the caller owns its lifetime.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> MotionResult<ExtractionSummary> {
        let clock = RunClock::start();
        let total_frames = source.info().frame_count;
        let mut references = ReferenceFrames::for_delay(self.config.delay);

        tracing::info!(
            delay = self.config.delay,
            mode = ?self.config.mode,
            gamma = self.tone_curve.gamma(),
            total_frames,
            "Starting motion extraction"
        );

        let mut frames_read = 0u64;
        let mut frames_written = 0u64;
        let mut frames_buffered = 0u64;
        let mut cancelled = false;

        loop {
            if self.is_cancelled() {
                tracing::warn!(frames_read, frames_written, "Extraction cancelled");
                cancelled = true;
                break;
            }

            tracing::trace!(stage = ?PipelineStage::Read, frames_read, "Reading frame");
            let Some(frame) = source.read_frame()? else {
                tracing::debug!(stage = ?PipelineStage::Done, frames_read, "Source exhausted");
                break;
            };
            frames_read += 1;
            let index = frame.index();

            let composited = references.advance(frame, |current, reference| {
                tracing::trace!(
                    stage = ?PipelineStage::Compare,
                    index = current.index(),
                    reference = reference.index(),
                    "Comparing frames"
                );
                let diff = self.differ.diff(current, reference)?;
                tracing::trace!(stage = ?PipelineStage::Composite, mode = ?self.config.mode, "Compositing");
                Ok(match self.config.mode {
                    CompositeMode::Overlay => self.compositor.overlay(current, &diff)?,
                    CompositeMode::ToneMapped => self.tone_curve.apply(diff),
                })
            })?;

            let stage = match composited {
                Some(output) => {
                    sink.write_frame(&output)?;
                    frames_written += 1;
                    PipelineStage::Write
                }
                None => {
                    frames_buffered += 1;
                    PipelineStage::Buffer
                }
            };
            tracing::trace!(stage = ?stage, index, "Frame done");

            if let Some(cb) = &self.progress {
                cb(progress_report(
                    &clock,
                    frames_read,
                    frames_written,
                    total_frames,
                    stage,
                ));
            }
        }

        if let Some(cb) = &self.progress {
            cb(ExtractionProgress {
                progress: if cancelled { ratio(frames_read, total_frames) } else { 1.0 },
                frames_read,
                frames_written,
                total_frames,
                eta_secs: 0.0,
                stage: PipelineStage::Done,
            });
        }

        let summary = ExtractionSummary {
            delay: self.config.delay,
            mode: self.config.mode,
            frames_read,
            frames_written,
            frames_buffered,
            cancelled,
            started_at: clock.epoch_wall().to_string(),
            elapsed_secs: clock.elapsed_secs(),
            throughput_fps: clock.throughput(frames_read),
        };
        tracing::info!(
            frames_read,
            frames_written,
            frames_buffered,
            cancelled,
            elapsed_secs = summary.elapsed_secs,
            "Motion extraction finished"
        );
        Ok(summary)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

fn ratio(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64).clamp(0.0, 1.0)
}

fn progress_report(
    clock: &RunClock,
    frames_read: u64,
    frames_written: u64,
    total_frames: u64,
    stage: PipelineStage,
) -> ExtractionProgress {
    let progress = ratio(frames_read, total_frames);
    ExtractionProgress {
        progress,
        frames_read,
        frames_written,
        total_frames,
        eta_secs: clock.eta_secs(progress),
        stage,
    }
}
