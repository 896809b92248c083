//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default caption segmentation parameters.
    pub segmentation: SegmentationDefaults,

    /// Where style presets come from.
    pub presets: PresetSourceConfig,

    /// Default export parameters.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default parameters for turning transcript words into cues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationDefaults {
    /// String placed between words when building cue text.
    pub joiner: String,

    /// Reading speed used to estimate how long a cue needs on screen.
    pub target_chars_per_second: f64,

    /// Cues shorter than this (seconds) are candidates for extension.
    pub min_cue_duration: f64,

    /// Upper bound on a cue's reading duration (seconds).
    pub max_cue_duration: f64,

    /// Gap inserted between an extended cue and the next one (seconds).
    pub inter_cue_gap: f64,

    /// Maximum number of words on a single caption line.
    pub max_words_per_line: usize,

    /// Whether short cues are stretched toward `min_cue_duration`.
    pub expand_short_cues: bool,
}

/// Preset catalog source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetSourceConfig {
    /// Optional JSON feed with remote preset additions and exclusions.
    pub remote_feed: Option<PathBuf>,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output frame rate used when sampling letter wipes.
    pub fps: u32,

    /// Video encoder passed to ffmpeg.
    pub video_codec: String,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Base word spacing in preview points.
    pub word_spacing: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "capcue=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for SegmentationDefaults {
    fn default() -> Self {
        Self {
            joiner: " ".to_string(),
            target_chars_per_second: 15.0,
            min_cue_duration: 0.1,
            max_cue_duration: 4.5,
            inter_cue_gap: 0.01,
            max_words_per_line: 4,
            expand_short_cues: true,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            video_codec: "libx264".to_string(),
            video_bitrate_kbps: 8000,
            word_spacing: 4.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("capcue").join("config.json")
}
