//! Caption project metadata and persistence.
//!
//! A project ties a source video to the cue list the user edits. It is
//! stored as a single pretty-printed JSON document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cue::Cue;

/// Current schema version written by [`CaptionProject::save`].
pub const PROJECT_SCHEMA_VERSION: &str = "1.0";

/// Top-level project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionProject {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier.
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// Source video the captions are laid over.
    pub video: VideoSource,

    /// Ordered, non-overlapping cues.
    #[serde(default)]
    pub cues: Vec<Cue>,
}

/// Reference to the source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSource {
    /// Path to the video file (absolute, or relative to the project file).
    pub path: PathBuf,

    /// Duration in seconds.
    pub duration_secs: f64,

    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,

    /// Frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    30
}

impl CaptionProject {
    /// Create a new, empty project for `video`.
    pub fn new(name: impl Into<String>, video: VideoSource) -> Self {
        let now = chrono::Utc::now();
        Self {
            version: PROJECT_SCHEMA_VERSION.to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.to_rfc3339(),
            modified_at: now.to_rfc3339(),
            video,
            cues: vec![],
        }
    }

    /// Load a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let project: CaptionProject =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        tracing::debug!(
            path = %path.display(),
            cues = project.cues.len(),
            "Loaded caption project"
        );
        Ok(project)
    }

    /// Save the project, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replace the cue list and bump the modification time.
    pub fn set_cues(&mut self, cues: Vec<Cue>) {
        self.cues = cues;
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Resolve the video path against the directory holding the project file.
    pub fn video_path(&self, project_file: &Path) -> PathBuf {
        if self.video.path.is_absolute() {
            return self.video.path.clone();
        }
        project_file
            .parent()
            .map(|dir| dir.join(&self.video.path))
            .unwrap_or_else(|| self.video.path.clone())
    }

    /// Check the cue list for problems that would break playback.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];
        for cue in &self.cues {
            if !cue.time_range.is_valid() {
                issues.push(format!(
                    "Cue {} has an invalid time range [{}, {})",
                    cue.id, cue.time_range.lower, cue.time_range.upper
                ));
            }
            if cue.time_range.upper > self.video.duration_secs + 1e-6 {
                issues.push(format!("Cue {} ends after the video", cue.id));
            }
            if let Some(timings) = cue.word_timings() {
                if let Some(last) = timings.last() {
                    if last.end > cue.time_range.upper + 1e-6 {
                        issues.push(format!("Cue {} has words past its end", cue.id));
                    }
                }
            }
        }
        for pair in self.cues.windows(2) {
            if pair[0].time_range.upper > pair[1].time_range.lower + 1e-9 {
                issues.push(format!("Cues {} and {} overlap", pair[0].id, pair[1].id));
            }
        }
        issues
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::cue::KaraokeVariant;
    use crate::timing::{TimeRange, WordTiming};

    fn sample_video() -> VideoSource {
        VideoSource {
            path: PathBuf::from("clip.mp4"),
            duration_secs: 10.0,
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }

    #[test]
    fn test_project_creation() {
        let project = CaptionProject::new("Interview", sample_video());
        assert_eq!(project.version, PROJECT_SCHEMA_VERSION);
        assert_eq!(project.id.len(), 36);
        assert!(project.cues.is_empty());
    }

    #[test]
    fn test_projects_created_together_get_distinct_ids() {
        let first = CaptionProject::new("a", sample_video());
        let second = CaptionProject::new("b", sample_video());
        assert_ne!(first.id, second.id);
        let parsed = uuid::Uuid::parse_str(&first.id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("capcue_test_project_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("project.json");

        let mut project = CaptionProject::new("Roundtrip", sample_video());
        project.set_cues(vec![Cue::karaoke(
            "cue-0001",
            "Hello world",
            TimeRange::new(0.0, 1.0),
            KaraokeVariant::WordHighlight {
                highlight_color: Color::YELLOW,
                font_color: Color::WHITE,
            },
            vec![
                WordTiming::new("Hello", 0.0, 0.5),
                WordTiming::new("world", 0.5, 1.0),
            ],
        )]);
        project.save(&path).unwrap();

        let loaded = CaptionProject::load(&path).unwrap();
        assert_eq!(loaded.name, "Roundtrip");
        assert_eq!(loaded.cues, project.cues);
        assert_eq!(loaded.video_path(&path), dir.join("clip.mp4"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = CaptionProject::load("/nonexistent/capcue/project.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/capcue/project.json"));
    }

    #[test]
    fn test_validate_reports_overlap_and_overrun() {
        let mut project = CaptionProject::new("Validate", sample_video());
        project.cues = vec![
            Cue::plain("a", "one", TimeRange::new(0.0, 2.0)),
            Cue::plain("b", "two", TimeRange::new(1.5, 3.0)),
            Cue::plain("c", "three", TimeRange::new(9.0, 12.0)),
        ];
        let issues = project.validate();
        assert!(issues.iter().any(|i| i.contains("a and b overlap")));
        assert!(issues.iter().any(|i| i.contains("c ends after the video")));
    }
}
