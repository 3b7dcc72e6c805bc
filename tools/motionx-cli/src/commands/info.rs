//! Show source video properties.

use std::path::PathBuf;

use motionx_render_engine::ffmpeg::probe;

pub fn run(input: PathBuf, json: bool) -> anyhow::Result<()> {
    let info = probe(&input).map_err(|e| anyhow::anyhow!("Failed to probe video: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Video: {}", input.display());
    println!("  Resolution: {}x{}", info.width, info.height);
    println!("  Frame rate: {:.3} fps", info.fps);
    println!("  Frames: {}", info.frame_count);
    println!("  Duration: {:.2}s", info.duration_secs());
    if let Some(codec) = &info.codec {
        println!("  Codec: {codec}");
    }

    Ok(())
}
