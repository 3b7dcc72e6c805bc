//! Extraction jobs: open the media, validate the offset, run the pipeline.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use motionx_common::error::{MotionError, MotionResult};
use motionx_frame_model::{Offset, OffsetError, OffsetSpec, VideoInfo};
use motionx_processing_core::ToneCurve;
use serde::Serialize;

use crate::codec::VideoCodec;
use crate::ffmpeg::{ffmpeg_available, ffprobe_available, FfmpegSink, FfmpegSource};
use crate::media::{FrameSink, FrameSource};
use crate::pipeline::{
    CompositeMode, ExtractionConfig, ExtractionSummary, MotionExtractionPipeline,
    ProgressCallback,
};

/// A motion extraction ready to run.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Source video.
    pub input: PathBuf,

    /// Output video.
    pub output: PathBuf,

    /// Requested delay between a frame and its reference.
    pub offset: OffsetSpec,

    /// Composite step for difference frames.
    pub mode: CompositeMode,

    /// Output codec.
    pub codec: VideoCodec,

    /// Tone curve exponent.
    pub gamma: f64,

    /// Where to write a JSON run report, if anywhere.
    pub report_path: Option<PathBuf>,
}

/// Resolve the requested offset against the source.
///
/// Fails with [`MotionError::OffsetTooLarge`] when the delay would leave no
/// frame to compare.
pub fn plan_extraction(
    info: &VideoInfo,
    offset: OffsetSpec,
    mode: CompositeMode,
) -> MotionResult<ExtractionConfig> {
    let offset = Offset::resolve(offset, info).map_err(offset_error)?;
    if offset.is_fixed_reference() {
        tracing::debug!("Zero offset, comparing every frame with the first");
    }
    Ok(ExtractionConfig {
        delay: offset.as_delay(),
        mode,
    })
}

fn offset_error(err: OffsetError) -> MotionError {
    if err.is_too_large() {
        MotionError::OffsetTooLarge {
            message: err.to_string(),
        }
    } else {
        MotionError::config(err.to_string())
    }
}

/// Run the pipeline from `source` to `sink` and finish the sink.
///
/// On failure the sink is left to its owner to release.
pub fn run_extraction(
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    config: ExtractionConfig,
    tone_curve: ToneCurve,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressCallback>,
) -> MotionResult<ExtractionSummary> {
    let mut pipeline = MotionExtractionPipeline::new(config, tone_curve);
    if let Some(flag) = cancel {
        pipeline = pipeline.with_cancel_flag(flag);
    }
    if let Some(cb) = progress {
        pipeline = pipeline.with_progress(cb);
    }

    let summary = pipeline.run(source, sink)?;
    sink.finish()?;
    Ok(summary)
}

/// Extract motion from a video file into a new video file.
///
/// This is the main entry point for file-to-file runs.
pub fn extract_video(
    job: &ExtractionJob,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressCallback>,
) -> MotionResult<ExtractionSummary> {
    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        offset = ?job.offset,
        mode = ?job.mode,
        codec = %job.codec,
        "Starting extraction"
    );

    if !ffmpeg_available() || !ffprobe_available() {
        return Err(MotionError::unsupported(
            "ffmpeg and ffprobe must be installed and in PATH",
        ));
    }

    let tone_curve = ToneCurve::new(job.gamma)?;
    let mut source = FfmpegSource::open(&job.input)?;
    let info = source.info().clone();
    let config = plan_extraction(&info, job.offset, job.mode)?;
    tracing::info!(delay = config.delay, "Resolved offset");

    let mut sink = FfmpegSink::create(&job.output, info.width, info.height, info.fps, job.codec)?;
    let summary = run_extraction(
        &mut source,
        &mut sink,
        config,
        tone_curve,
        cancel,
        progress,
    )?;

    if let Some(report_path) = &job.report_path {
        write_report(report_path, job, &info, &summary)?;
    }

    Ok(summary)
}

#[derive(Debug, Serialize)]
struct ExtractionReport<'a> {
    input: &'a Path,
    output: &'a Path,
    codec: VideoCodec,
    fourcc: &'static str,
    gamma: f64,
    source: &'a VideoInfo,
    summary: &'a ExtractionSummary,
}

fn write_report(
    path: &Path,
    job: &ExtractionJob,
    info: &VideoInfo,
    summary: &ExtractionSummary,
) -> MotionResult<()> {
    let report = ExtractionReport {
        input: &job.input,
        output: &job.output,
        codec: job.codec,
        fourcc: job.codec.fourcc(),
        gamma: job.gamma,
        source: info,
        summary,
    };
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(report = %path.display(), "Wrote run report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_rejects_offset_equal_to_length() {
        let info = VideoInfo::new(8, 8, 10.0, 10);
        let err = plan_extraction(&info, OffsetSpec::Frames(10), CompositeMode::Overlay)
            .unwrap_err();
        assert!(matches!(err, MotionError::OffsetTooLarge { .. }));
    }

    #[test]
    fn test_plan_maps_invalid_seconds_to_config_error() {
        let info = VideoInfo::new(8, 8, 10.0, 10);
        let err = plan_extraction(&info, OffsetSpec::Seconds(f64::NAN), CompositeMode::ToneMapped)
            .unwrap_err();
        assert!(matches!(err, MotionError::Config { .. }));
    }

    #[test]
    fn test_plan_keeps_mode() {
        let info = VideoInfo::new(8, 8, 30.0, 300);
        let config = plan_extraction(&info, OffsetSpec::Seconds(2.0), CompositeMode::Overlay).unwrap();
        assert_eq!(config.delay, 60);
        assert_eq!(config.mode, CompositeMode::Overlay);
    }

    #[test]
    fn test_report_serializes_summary() {
        let dir = std::env::temp_dir().join("motionx_test_report");
        std::fs::create_dir_all(&dir).unwrap();
        let report_path = dir.join("run.json");

        let job = ExtractionJob {
            input: PathBuf::from("in.mp4"),
            output: PathBuf::from("out.mp4"),
            offset: OffsetSpec::Frames(1),
            mode: CompositeMode::ToneMapped,
            codec: VideoCodec::H264,
            gamma: 1.0,
            report_path: Some(report_path.clone()),
        };
        let info = VideoInfo::new(2, 2, 30.0, 3);
        let summary = ExtractionSummary {
            delay: 1,
            mode: CompositeMode::ToneMapped,
            frames_read: 3,
            frames_written: 2,
            frames_buffered: 1,
            cancelled: false,
            started_at: "2024-01-01T00:00:00+00:00".to_string(),
            elapsed_secs: 0.5,
            throughput_fps: 6.0,
        };

        write_report(&report_path, &job, &info, &summary).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(value["fourcc"], "avc1");
        assert_eq!(value["summary"]["frames_written"], 2);
        assert_eq!(value["source"]["frame_count"], 3);

        std::fs::remove_dir_all(&dir).ok();
    }
}
