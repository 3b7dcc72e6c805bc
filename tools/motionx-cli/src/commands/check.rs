//! Check system capabilities.

use motionx_render_engine::ffmpeg::{ffmpeg_available, ffprobe_available};

pub fn run() -> anyhow::Result<()> {
    println!("Motionx System Check");
    println!("{}", "=".repeat(50));

    let tools = [("ffmpeg", ffmpeg_available()), ("ffprobe", ffprobe_available())];
    for (name, available) in tools {
        if available {
            println!("[OK] {name} found in PATH");
        } else {
            println!("[MISSING] {name} not found in PATH");
        }
    }

    println!();
    if tools.iter().all(|(_, available)| *available) {
        println!("All required tools are available. Motionx is ready.");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Install ffmpeg (which ships ffprobe) and make sure it is on PATH"
        ))
    }
}
