//! Extract motion from a video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use motionx_frame_model::OffsetSpec;
use motionx_render_engine::{
    extract_video, CompositeMode, ExtractionJob, ExtractionProgress, ProgressCallback, VideoCodec,
};

/// Parsed `extract` arguments, with config defaults already applied.
pub struct ExtractArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub frames: Option<u64>,
    pub seconds: Option<f64>,
    pub overlay: bool,
    pub codec: String,
    pub gamma: f64,
    pub report: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let job = build_job(args)?;

    println!("Extracting motion from: {}", job.input.display());
    println!("  Output: {}", job.output.display());
    println!("  Offset: {}", describe_offset(job.offset));
    println!("  Mode: {:?}", job.mode);
    println!("  Codec: {} ({})", job.codec, job.codec.fourcc());

    let cancel = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current frame");
            ctrl_c_flag.store(true, Ordering::SeqCst);
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: ExtractionProgress| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames read, {} written, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_read,
            p.total_frames,
            p.frames_written,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    let output_path = job.output.clone();
    let result =
        tokio::task::spawn_blocking(move || extract_video(&job, Some(cancel), Some(progress_cb)))
            .await;
    ctrl_c.abort();

    let summary = result
        .map_err(|e| anyhow::anyhow!("Extraction task failed: {e}"))?
        .map_err(|e| {
            println!();
            if e.is_setup_error() {
                anyhow::anyhow!("Cannot start extraction: {e}")
            } else {
                anyhow::anyhow!("Extraction failed: {e}")
            }
        })?;

    if summary.cancelled {
        println!(
            "\nExtraction cancelled after {} frame(s); partial output at {}",
            summary.frames_written,
            output_path.display()
        );
        return Err(anyhow::anyhow!("Cancelled"));
    }

    println!(
        "\nExtraction complete: {} ({} frames in {:.1}s, {:.1} fps)",
        output_path.display(),
        summary.frames_written,
        summary.elapsed_secs,
        summary.throughput_fps,
    );
    Ok(())
}

fn build_job(args: ExtractArgs) -> anyhow::Result<ExtractionJob> {
    let offset = match (args.frames, args.seconds) {
        (Some(frames), None) => OffsetSpec::Frames(frames),
        (None, Some(secs)) => OffsetSpec::Seconds(secs),
        _ => return Err(anyhow::anyhow!("Pass exactly one of --frames or --seconds")),
    };
    let codec: VideoCodec = args.codec.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    Ok(ExtractionJob {
        input: args.input,
        output: args.output,
        offset,
        mode: CompositeMode::from_overlay_flag(args.overlay),
        codec,
        gamma: args.gamma,
        report_path: args.report,
    })
}

fn describe_offset(offset: OffsetSpec) -> String {
    match offset {
        OffsetSpec::Frames(n) => format!("{n} frame(s)"),
        OffsetSpec::Seconds(s) => format!("{s} second(s)"),
    }
}
