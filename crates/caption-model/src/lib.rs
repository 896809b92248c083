//! Capcue Caption Model
//!
//! Defines the core data contracts for caption projects:
//! - **Timing:** Word timings and half-open cue time ranges
//! - **Cues:** Timed caption entries with optional karaoke data
//! - **Style:** Explicit style attributes and colors
//! - **Transcript:** Word-level transcription input
//! - **Project:** Persisted cue lists and copy-on-write editing snapshots
//!
//! All times are seconds from the start of the source video.

pub mod color;
pub mod cue;
pub mod project;
pub mod session;
pub mod style;
pub mod timing;
pub mod transcript;

pub use color::*;
pub use cue::*;
pub use project::*;
pub use session::*;
pub use style::*;
pub use timing::*;
pub use transcript::*;
