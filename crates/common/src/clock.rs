//! Frame clock and timecode utilities.
//!
//! Playback and export both address caption state by a time in seconds.
//! This module converts between frame indices and presentation times and
//! formats timecodes for subtitle files.

/// Maps frame indices to presentation timestamps for a fixed frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock for the given frame rate (clamped to at least 1 fps).
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Presentation time of the start of `frame`.
    pub fn frame_time(&self, frame: u64) -> f64 {
        frame as f64 / self.fps as f64
    }

    /// Index of the frame being shown at `secs`.
    pub fn frame_at(&self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        (secs * self.fps as f64).floor() as u64
    }

    /// Number of frames needed to cover `duration_secs`.
    pub fn total_frames(&self, duration_secs: f64) -> u64 {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return 0;
        }
        (duration_secs * self.fps as f64).ceil() as u64
    }

}

/// Timecode separator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeStyle {
    /// `HH:MM:SS,mmm`
    Srt,
    /// `HH:MM:SS.mmm`
    Vtt,
    /// `H:MM:SS.cc`
    Ass,
}

/// Format seconds as a subtitle timecode.
pub fn format_timecode(secs: f64, style: TimecodeStyle) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let total_ms = (secs * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    match style {
        TimecodeStyle::Srt => format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}"),
        TimecodeStyle::Vtt => format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}"),
        TimecodeStyle::Ass => {
            let centis = (total_ms % 60_000) / 10 % 100;
            format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_roundtrip() {
        let clock = FrameClock::new(30);
        assert!((clock.frame_time(45) - 1.5).abs() < 1e-9);
        assert_eq!(clock.frame_at(1.5), 45);
        assert_eq!(clock.frame_at(-2.0), 0);
        assert_eq!(clock.frame_at(f64::NAN), 0);
    }

    #[test]
    fn test_total_frames_rounds_up() {
        let clock = FrameClock::new(24);
        assert_eq!(clock.total_frames(1.01), 25);
        assert_eq!(clock.total_frames(0.0), 0);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fps(), 1);
        assert!((clock.frame_duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_timecode(0.0, TimecodeStyle::Srt), "00:00:00,000");
        assert_eq!(format_timecode(3661.5, TimecodeStyle::Srt), "01:01:01,500");
        assert_eq!(format_timecode(3661.5, TimecodeStyle::Vtt), "01:01:01.500");
        assert_eq!(format_timecode(61.25, TimecodeStyle::Ass), "0:01:01.25");
        assert_eq!(format_timecode(-4.0, TimecodeStyle::Vtt), "00:00:00.000");
    }
}
