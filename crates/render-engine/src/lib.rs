//! Capcue Render Engine
//!
//! Everything needed to put captions on screen, live or offline:
//! - **Composition:** One caption frame function shared by both render paths
//! - **Overlay:** ASS script generation sampled from that function
//! - **Export:** Compositor trait, ffmpeg backend, and the staged progress
//!   controller
//!
//! # Pipeline Architecture
//!
//! ```text
//! cues + resolved styles ──► compose_caption(.., Export) ──► captions.ass
//!                                                               │
//! source video ─────────────────────────────────► ffmpeg subtitles burn
//!                                                               │
//!                             -progress pipe:1 ──► raw events ──┤
//!                                                               ▼
//!                      ExportPipelineController ◄── bounded channel
//!                                │
//!                                ▼
//!                   Preparing → Compositing → Saving → Completed
//! ```

pub mod ass;
pub mod compositor;
pub mod export;
pub mod ffmpeg;

pub use compositor::{active_cues, compose_caption, CaptionFrame, StyledCue};
pub use export::*;
pub use ffmpeg::FfmpegCompositor;
