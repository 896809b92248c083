//! Build a caption project from a word-level transcript.

use std::path::PathBuf;

use capcue_caption_core::segmenter::{CueSegmenter, SegmenterConfig};
use capcue_caption_model::color::Color;
use capcue_caption_model::cue::{KaraokeVariant, DEFAULT_SCALE_FACTOR};
use capcue_caption_model::project::{CaptionProject, VideoSource};
use capcue_caption_model::transcript::Transcript;
use capcue_common::config::AppConfig;

pub struct SegmentArgs {
    pub transcript: PathBuf,
    pub video: PathBuf,
    pub output: PathBuf,
    pub max_words: Option<usize>,
    pub variant: String,
    pub preset: Option<String>,
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

pub fn run(config: &AppConfig, args: SegmentArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.transcript)?;
    let transcript = Transcript::from_json(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse transcript: {e}"))?;

    let mut segmenter_config = SegmenterConfig::from(&config.segmentation);
    segmenter_config.variant = parse_variant(&args.variant)?;
    if let Some(max_words) = args.max_words {
        segmenter_config.max_words_per_line = max_words;
    }

    let mut cues = CueSegmenter::new(segmenter_config).segment_transcript(&transcript);
    if let Some(preset) = &args.preset {
        for cue in &mut cues {
            cue.preset_name = Some(preset.clone());
        }
    }

    let last_end = cues.last().map(|c| c.time_range.upper).unwrap_or(0.0);
    let video = VideoSource {
        path: args.video,
        duration_secs: args.duration.unwrap_or(last_end),
        width: args.width,
        height: args.height,
        fps: args.fps,
    };

    let name = args
        .output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("captions")
        .trim_end_matches(".capcue")
        .to_string();
    let mut project = CaptionProject::new(name, video);
    project.set_cues(cues);
    project.save(&args.output)?;

    println!(
        "Segmented {} words into {} cues",
        transcript.word_count(),
        project.cues.len()
    );
    for issue in project.validate() {
        println!("  warning: {issue}");
    }
    println!("Project written to: {}", args.output.display());
    Ok(())
}

fn parse_variant(name: &str) -> anyhow::Result<KaraokeVariant> {
    let variant = match name {
        "word-highlight" => KaraokeVariant::WordHighlight {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
        },
        "word-background" => KaraokeVariant::WordBackground {
            highlight_color: Color::WHITE,
            bg_color: Color::rgb(124, 58, 237),
            font_color: Color::WHITE,
        },
        "word-and-scale" => KaraokeVariant::WordAndScale {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
            scale_factor: DEFAULT_SCALE_FACTOR,
        },
        "letter-wipe" => KaraokeVariant::LetterWipe {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
        },
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown variant: {name}. Use: word-highlight, word-background, word-and-scale, letter-wipe"
            ));
        }
    };
    Ok(variant)
}
