//! Capcue Caption Core
//!
//! The caption engine shared by the interactive preview and the offline
//! exporter:
//! - **Segmentation:** Turn word-level transcripts into timed cues
//! - **Karaoke:** Per-word and per-letter highlight state at any time
//! - **Style:** Resolve cue styles against the session's preset catalog
//! - **Calibration:** Spacing corrections that keep both render paths aligned
//! - **Subtitles:** SRT/VTT sidecar output
//!
//! This crate is pure computation with no I/O apart from loading a preset feed
//! and writing sidecar files. Every function here is safe to call on every
//! frame.

pub mod calibration;
pub mod karaoke;
pub mod segmenter;
pub mod style;
pub mod subtitles;

pub use calibration::{calibrated_spacing, spacing_for, RenderPath};
pub use karaoke::{highlight_frame, HighlightFrame, UnitHighlight};
pub use segmenter::{CueSegmenter, SegmenterConfig};
pub use style::{PresetCatalog, RemotePresetFeed, ResolvedStyle, StylePreset, StyleResolver};
