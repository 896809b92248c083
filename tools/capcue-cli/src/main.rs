//! Capcue CLI: turn transcripts into karaoke captions and burn them into video.
//!
//! Usage:
//!   capcue segment <TRANSCRIPT>   Build a caption project from a transcript
//!   capcue highlight <PROJECT>    Show highlight state at a point in time
//!   capcue presets                List the available style presets
//!   capcue subtitles <PROJECT>    Write SRT/VTT sidecar subtitles
//!   capcue export <PROJECT>       Burn captions into the source video
//!   capcue info <PROJECT>         Show project information

use std::path::PathBuf;

use capcue_common::config::AppConfig;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "capcue",
    about = "Word-synchronized karaoke captions for video",
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
    /// Build a caption project from a word-level transcript
    Segment {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Source video the captions belong to
        #[arg(long)]
        video: PathBuf,

        /// Project file to write
        #[arg(short, long, default_value = "captions.capcue.json")]
        output: PathBuf,

        /// Maximum words per cue (defaults to the configured value)
        #[arg(long)]
        max_words: Option<usize>,

        /// Karaoke variant: word-highlight|word-background|word-and-scale|letter-wipe
        #[arg(long, default_value = "word-highlight")]
        variant: String,

        /// Preset applied to every cue
        #[arg(long)]
        preset: Option<String>,

        /// Video duration in seconds (defaults to the end of the last cue)
        #[arg(long)]
        duration: Option<f64>,

        /// Video width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Video height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Video frame rate
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// Show which words are highlighted at a point in time
    Highlight {
        /// Project file
        project: PathBuf,

        /// Playback time in seconds
        #[arg(short, long)]
        time: f64,

        /// Print the caption frames as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available style presets
    Presets {
        /// Remote preset feed to merge (overrides the configured feed)
        #[arg(long)]
        feed: Option<PathBuf>,
    },

    /// Write SRT or WebVTT subtitles for a project
    Subtitles {
        /// Project file
        project: PathBuf,

        /// Output file; the extension picks the format (.srt or .vtt)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Burn the project's captions into its video
    Export {
        /// Project file
        project: PathBuf,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output frame rate (defaults to the source frame rate)
        #[arg(long)]
        fps: Option<u32>,

        /// Video encoder passed to ffmpeg
        #[arg(long)]
        codec: Option<String>,

        /// Video bitrate in kbps
        #[arg(long)]
        bitrate: Option<u32>,

        /// Remote preset feed to merge (overrides the configured feed)
        #[arg(long)]
        feed: Option<PathBuf>,
    },

    /// Show project information
    Info {
        /// Project file
        project: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    capcue_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Segment {
            transcript,
            video,
            output,
            max_words,
            variant,
            preset,
            duration,
            width,
            height,
            fps,
        } => commands::segment::run(
            &config,
            commands::segment::SegmentArgs {
                transcript,
                video,
                output,
                max_words,
                variant,
                preset,
                duration,
                width,
                height,
                fps,
            },
        ),
        Commands::Highlight {
            project,
            time,
            json,
        } => commands::highlight::run(&config, project, time, json),
        Commands::Presets { feed } => commands::presets::run(&config, feed),
        Commands::Subtitles { project, output } => commands::subtitles::run(project, output),
        Commands::Export {
            project,
            output,
            fps,
            codec,
            bitrate,
            feed,
        } => commands::export::run(&config, project, output, fps, codec, bitrate, feed).await,
        Commands::Info { project } => commands::info::run(project),
    }
}
