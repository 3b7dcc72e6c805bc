//! ffmpeg-backed media source and sink.
//!
//! Decoding and encoding run in `ffmpeg` child processes that exchange raw
//! `bgr24` frames with this process over pipes. Source properties come from
//! `ffprobe`.

use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use motionx_common::error::{MotionError, MotionResult};
use motionx_frame_model::{Frame, FrameShape, PixelFormat, VideoInfo};
use serde::Deserialize;

use crate::codec::VideoCodec;
use crate::media::{FrameSink, FrameSource};

const RAW_FORMAT: PixelFormat = PixelFormat::Bgr24;

/// Whether `ffmpeg` is on `PATH`.
pub fn ffmpeg_available() -> bool {
    command_exists("ffmpeg")
}

/// Whether `ffprobe` is on `PATH`.
pub fn ffprobe_available() -> bool {
    command_exists("ffprobe")
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Query the properties of the first video stream in `path`.
pub fn probe(path: &Path) -> MotionResult<VideoInfo> {
    if !path.exists() {
        return Err(MotionError::open(path, "No such file"));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,codec_name,r_frame_rate,avg_frame_rate,nb_frames,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| MotionError::open(path, format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(MotionError::open(
            path,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&raw).map_err(|message| MotionError::open(path, message))?;
    tracing::debug!(
        path = %path.display(),
        width = info.width,
        height = info.height,
        fps = info.fps,
        frame_count = info.frame_count,
        "Probed source"
    );
    Ok(info)
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_output(raw: &str) -> Result<VideoInfo, String> {
    let probe: ProbeOutput =
        serde_json::from_str(raw).map_err(|e| format!("Unreadable ffprobe output: {e}"))?;
    let stream = probe
        .streams
        .first()
        .ok_or_else(|| "No video stream found".to_string())?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err("Video stream has no dimensions".to_string()),
    };

    let fps = [&stream.r_frame_rate, &stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_rate(rate))
        .ok_or_else(|| "Video stream has no frame rate".to_string())?;

    let duration_secs = stream
        .duration
        .as_deref()
        .or_else(|| probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| duration_secs.map(|d| (d * fps).round() as u64))
        .ok_or_else(|| "Could not determine the number of frames".to_string())?;

    Ok(VideoInfo {
        width,
        height,
        fps,
        frame_count,
        codec: stream.codec_name.clone(),
    })
}

/// Parse an ffprobe rational such as `30000/1001`.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// A command started in its own process group. A terminal interrupt then
/// reaches only this process, which stops the run through its cancel flag.
fn detached_command(program: &str) -> Command {
    let mut command = Command::new(program);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command
}

/// A running ffmpeg child with its stderr drained on a helper thread.
struct FfmpegProcess {
    child: Child,
    stderr_task: Option<JoinHandle<String>>,
}

impl FfmpegProcess {
    fn spawn(args: &[String], stdin: Stdio, stdout: Stdio) -> std::io::Result<Self> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = detached_command("ffmpeg")
            .args(args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = child.stderr.take().map(|stderr| {
            std::thread::spawn(move || -> String {
                let mut reader = BufReader::new(stderr);
                let mut output = String::new();
                match reader.read_to_string(&mut output) {
                    Ok(_) => output,
                    Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
                }
            })
        });

        tracing::debug!(pid = child.id(), "ffmpeg process started");
        Ok(Self { child, stderr_task })
    }

    /// Wait for exit and return stderr when the process failed.
    fn wait(&mut self) -> std::io::Result<Result<(), String>> {
        let status = self.child.wait()?;
        let stderr_output = self
            .stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default();

        if status.success() {
            Ok(Ok(()))
        } else {
            Ok(Err(format!("status {status}: {}", stderr_output.trim())))
        }
    }

    fn kill(&mut self) {
        if let Err(err) = self.child.kill() {
            if err.kind() != ErrorKind::InvalidInput {
                tracing::warn!(error = %err, "Failed to kill ffmpeg");
            }
        }
        let _ = self.wait();
    }
}

/// Decodes a video file into raw frames.
pub struct FfmpegSource {
    info: VideoInfo,
    shape: FrameShape,
    reader: Option<BufReader<ChildStdout>>,
    process: Option<FfmpegProcess>,
    next_index: u64,
}

impl FfmpegSource {
    /// Probe `path` and start decoding it.
    pub fn open(path: impl AsRef<Path>) -> MotionResult<Self> {
        let path = path.as_ref();
        let info = probe(path)?;

        let args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            "-i".to_string(),
            path.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            RAW_FORMAT.ffmpeg_name().to_string(),
            "-".to_string(),
        ];

        let mut process = FfmpegProcess::spawn(&args, Stdio::null(), Stdio::piped())
            .map_err(|e| MotionError::open(path, format!("Failed to start ffmpeg: {e}")))?;
        let stdout = process
            .child
            .stdout
            .take()
            .ok_or_else(|| MotionError::open(path, "Failed to capture ffmpeg stdout"))?;

        tracing::info!(
            input = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            frames = info.frame_count,
            "Opened source"
        );

        Ok(Self {
            shape: info.frame_shape(),
            info,
            reader: Some(BufReader::new(stdout)),
            process: Some(process),
            next_index: 0,
        })
    }

    /// Close the decoder after the last frame and surface its exit status.
    fn close(&mut self) -> MotionResult<()> {
        self.reader = None;
        if let Some(mut process) = self.process.take() {
            let outcome = process
                .wait()
                .map_err(|e| MotionError::decode(format!("Failed to wait on ffmpeg: {e}")))?;
            outcome.map_err(|stderr| MotionError::decode(format!("ffmpeg decode failed ({stderr})")))?;
        }
        Ok(())
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> MotionResult<Option<Frame>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.shape.byte_len()];
        let filled = read_full(reader, &mut data)
            .map_err(|e| MotionError::decode(format!("Failed reading decoded frames: {e}")))?;

        if filled == 0 {
            self.close()?;
            return Ok(None);
        }
        if filled < data.len() {
            self.close()?;
            return Err(MotionError::decode(format!(
                "Truncated frame {}: got {filled} of {} byte(s)",
                self.next_index,
                data.len()
            )));
        }

        let frame = Frame::from_shape(self.shape, data)
            .map_err(|e| MotionError::decode(e.to_string()))?
            .with_index(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.reader = None;
        if let Some(mut process) = self.process.take() {
            process.kill();
        }
    }
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Encodes raw frames into a video file.
pub struct FfmpegSink {
    path: PathBuf,
    shape: FrameShape,
    writer: Option<BufWriter<ChildStdin>>,
    process: Option<FfmpegProcess>,
    frames_written: u64,
}

impl FfmpegSink {
    /// Start an encoder writing `width`x`height` frames at `fps` to `path`.
    pub fn create(
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        fps: f64,
        codec: VideoCodec,
    ) -> MotionResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| MotionError::create(path, format!("{e}")))?;
        }

        let args = encoder_args(path, width, height, fps, codec);
        let mut process = FfmpegProcess::spawn(&args, Stdio::piped(), Stdio::null())
            .map_err(|e| MotionError::create(path, format!("Failed to start ffmpeg: {e}")))?;
        let stdin = process
            .child
            .stdin
            .take()
            .ok_or_else(|| MotionError::create(path, "Failed to capture ffmpeg stdin"))?;

        tracing::info!(
            output = %path.display(),
            codec = %codec,
            fourcc = codec.fourcc(),
            width,
            height,
            fps,
            "Created sink"
        );

        Ok(Self {
            path: path.to_path_buf(),
            shape: FrameShape::new(width, height, RAW_FORMAT),
            writer: Some(BufWriter::new(stdin)),
            process: Some(process),
            frames_written: 0,
        })
    }

    /// Close stdin so ffmpeg flushes, then wait for it to exit.
    fn close(&mut self) -> MotionResult<()> {
        let flushed = match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        };
        if let Some(mut process) = self.process.take() {
            let outcome = process
                .wait()
                .map_err(|e| MotionError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
            outcome.map_err(|stderr| MotionError::encode(format!("ffmpeg encode failed ({stderr})")))?;
        }
        flushed.map_err(|e| MotionError::encode(format!("Failed to flush frames: {e}")))
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> MotionResult<()> {
        if frame.shape() != self.shape {
            return Err(MotionError::DimensionMismatch {
                expected: self.shape.to_string(),
                actual: frame.shape().to_string(),
            });
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MotionError::encode("Sink already finished"))?;

        if let Err(err) = writer.write_all(frame.data()) {
            // A broken pipe means ffmpeg exited; its stderr says why.
            let reason = match self.close() {
                Err(close_err) => close_err.to_string(),
                Ok(()) => err.to_string(),
            };
            return Err(MotionError::encode(format!(
                "Failed writing frame {}: {reason}",
                frame.index()
            )));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> MotionResult<()> {
        self.close()?;
        tracing::info!(
            output = %self.path.display(),
            frames = self.frames_written,
            "Finalized output"
        );
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.process.is_some() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, output = %self.path.display(), "Failed to finalize output");
            }
        }
    }
}

fn encoder_args(path: &Path, width: u32, height: u32, fps: f64, codec: VideoCodec) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        RAW_FORMAT.ffmpeg_name().to_string(),
        "-s".to_string(),
        format!("{width}x{height}"),
        "-r".to_string(),
        format!("{fps}"),
        "-i".to_string(),
        "-".to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        codec.encoder().to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];
    // Only ISO-BMFF containers carry a fourcc sample entry.
    let iso_container = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "mp4" | "mov" | "m4v"));
    if iso_container {
        args.push("-tag:v".to_string());
        args.push(codec.fourcc().to_string());
    }
    args.push(path.display().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe_output_with_frame_count() {
        let raw = r#"{
            "programs": [],
            "streams": [{
                "codec_name": "h264",
                "width": 1280,
                "height": 720,
                "r_frame_rate": "30/1",
                "avg_frame_rate": "30/1",
                "duration": "10.000000",
                "nb_frames": "300"
            }],
            "format": { "duration": "10.010000" }
        }"#;
        let info = parse_probe_output(raw).unwrap();
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.frame_count, 300);
        assert_eq!(info.codec.as_deref(), Some("h264"));
    }

    #[test]
    fn test_parse_probe_output_estimates_frames_from_duration() {
        let raw = r#"{
            "streams": [{
                "width": 640,
                "height": 480,
                "r_frame_rate": "0/0",
                "avg_frame_rate": "25/1"
            }],
            "format": { "duration": "4.0" }
        }"#;
        let info = parse_probe_output(raw).unwrap();
        assert_eq!(info.fps, 25.0);
        assert_eq!(info.frame_count, 100);
    }

    #[test]
    fn test_parse_probe_output_without_stream() {
        let err = parse_probe_output(r#"{ "streams": [] }"#).unwrap_err();
        assert!(err.contains("No video stream"));
    }

    #[test]
    fn test_read_full_reports_short_reads() {
        let mut data: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 5];
        assert_eq!(read_full(&mut data, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_encoder_args_tag_codec() {
        let args = encoder_args(Path::new("out.mp4"), 640, 360, 29.97, VideoCodec::H264);
        assert!(args.windows(2).any(|w| w == ["-s", "640x360"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-tag:v", "avc1"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_encoder_args_skip_tag_outside_mp4() {
        let args = encoder_args(Path::new("out.webm"), 640, 360, 30.0, VideoCodec::Vp9);
        assert!(!args.iter().any(|a| a == "-tag:v"));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
    }

    #[test]
    fn test_probe_missing_file_is_open_error() {
        let err = probe(Path::new("/definitely/not/here.mp4")).unwrap_err();
        assert!(matches!(err, MotionError::Open { .. }));
    }

    /// Process group id from `/proc/<pid>/stat`.
    #[cfg(target_os = "linux")]
    fn process_group_of(pid: &str) -> u32 {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).unwrap();
        // After the parenthesised command name: state, ppid, pgrp.
        let fields = &stat[stat.rfind(')').unwrap() + 1..];
        fields.split_whitespace().nth(2).unwrap().parse().unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_children_lead_their_own_process_group() {
        let mut child = detached_command("sleep").arg("5").spawn().unwrap();
        let child_group = process_group_of(&child.id().to_string());
        let own_group = process_group_of("self");
        child.kill().ok();
        child.wait().ok();

        assert_eq!(child_group, child.id());
        assert_ne!(child_group, own_group);
    }
}
