//! Motionx CLI: extract motion from video files.
//!
//! Usage:
//!   motionx extract <IN> <OUT> -f N     Compare each frame with the one N frames earlier
//!   motionx extract <IN> <OUT> -s S     Same, with the delay given in seconds
//!   motionx info <IN>                   Show source video properties
//!   motionx check                       Check that ffmpeg is installed

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use motionx_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "motionx",
    about = "Reveal motion in video by differencing time-delayed frames",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract motion from a video
    #[command(group(ArgGroup::new("offset").required(true).args(["frames", "seconds"])))]
    Extract {
        /// Source video
        input: PathBuf,

        /// Output video
        output: PathBuf,

        /// Offset in frames
        #[arg(short, long)]
        frames: Option<u64>,

        /// Offset in seconds (decimals allowed)
        #[arg(short, long)]
        seconds: Option<f64>,

        /// Overlay the motion mask on the source instead of writing the raw difference
        #[arg(short, long)]
        overlay: bool,

        /// Write the raw difference even if the config enables overlays
        #[arg(long, conflicts_with = "overlay")]
        no_overlay: bool,

        /// Output codec: h264|h265|vp9
        #[arg(long)]
        codec: Option<String>,

        /// Tone curve exponent for difference frames
        #[arg(long)]
        gamma: Option<f64>,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show source video properties
    Info {
        /// Source video
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    motionx_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Extract {
            input,
            output,
            frames,
            seconds,
            overlay,
            no_overlay,
            codec,
            gamma,
            report,
        } => {
            let args = commands::extract::ExtractArgs {
                input,
                output,
                frames,
                seconds,
                overlay: overlay_enabled(overlay, no_overlay, config.extraction.overlay),
                codec: codec.unwrap_or_else(|| config.extraction.codec.clone()),
                gamma: gamma.unwrap_or(config.extraction.gamma),
                report,
            };
            commands::extract::run(args).await
        }
        Commands::Info { input, json } => commands::info::run(input, json),
        Commands::Check => commands::check::run(),
    }
}

/// Explicit flags win over the configured default.
fn overlay_enabled(overlay: bool, no_overlay: bool, configured: bool) -> bool {
    if overlay {
        true
    } else if no_overlay {
        false
    } else {
        configured
    }
}
