//! Karaoke highlight engine.
//!
//! Maps `(cue, t)` to the highlight state of each word or letter. Every
//! function here is pure: the preview calls it on every displayed frame
//! (including while scrubbing backwards) and the exporter calls it once per
//! rendered frame at that frame's exact timestamp, so both see identical
//! state.

use capcue_caption_model::color::Color;
use capcue_caption_model::cue::{Cue, KaraokeVariant};

/// Granularity of a highlight frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightUnit {
    Word,
    Letter,
}

/// Visual state of one word or letter at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitHighlight {
    /// The word, or the single character for letter frames.
    pub text: String,
    /// 0 = base look, 1 = fully highlighted. Letters may be in between.
    pub activation: f64,
    /// Color used for the highlighted portion.
    pub highlight_color: Color,
    /// Color used for the non-highlighted portion.
    pub base_color: Color,
    /// Box drawn behind the unit while it is active.
    pub background: Option<Color>,
    /// Render scale of the unit.
    pub scale: f64,
}

impl UnitHighlight {
    /// Solid color for renderers that cannot draw partial wipes. Letter
    /// wipes on the export path use karaoke fill timing instead.
    pub fn effective_color(&self) -> Color {
        if self.activation >= 0.5 {
            self.highlight_color
        } else {
            self.base_color
        }
    }

    pub fn is_active(&self) -> bool {
        self.activation >= 1.0
    }
}

/// Highlight state of a whole cue at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightFrame {
    pub unit: HighlightUnit,
    pub units: Vec<UnitHighlight>,
}

impl HighlightFrame {
    fn empty() -> Self {
        Self {
            unit: HighlightUnit::Word,
            units: vec![],
        }
    }

    /// Index of the fully active unit, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.units.iter().position(UnitHighlight::is_active)
    }
}

/// Per-word activation: 1 while `start <= t < end`, else 0.
///
/// Not cumulative: a word that has been spoken drops back to 0. Cues
/// without karaoke data, and non-finite `t`, yield all zeros.
pub fn word_activations(cue: &Cue, t: f64) -> Vec<f64> {
    let Some(timings) = cue.word_timings() else {
        return vec![];
    };
    timings
        .iter()
        .map(|word| {
            if t.is_finite() && word.contains(t) {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Index of the word being spoken at `t`.
pub fn active_word_index(cue: &Cue, t: f64) -> Option<usize> {
    if !t.is_finite() {
        return None;
    }
    cue.word_timings()?.iter().position(|word| word.contains(t))
}

/// Time slice `[start, end)` over which each character of the cue fills.
///
/// The cue's duration is split evenly across the characters of its text.
pub fn letter_windows(cue: &Cue) -> Vec<(f64, f64)> {
    let count = cue.text.chars().count();
    if count == 0 {
        return vec![];
    }
    let range = cue.time_range;
    let slice = range.duration().max(0.0) / count as f64;
    (0..count)
        .map(|i| {
            let start = range.lower + slice * i as f64;
            (start, start + slice)
        })
        .collect()
}

/// Per-character wipe progress in `[0, 1]`.
///
/// Character `i` fills linearly over its [`letter_windows`] slice.
pub fn letter_progress(cue: &Cue, t: f64) -> Vec<f64> {
    letter_windows(cue)
        .into_iter()
        .map(|(letter_start, letter_end)| {
            if !t.is_finite() {
                return 0.0;
            }
            if letter_end <= letter_start {
                return if t >= letter_start { 1.0 } else { 0.0 };
            }
            ((t - letter_start) / (letter_end - letter_start)).clamp(0.0, 1.0)
        })
        .collect()
}

pub fn highlight_frame(cue: &Cue, t: f64) -> HighlightFrame {
    match cue.variant() {
        Some(variant) => highlight_frame_with(cue, variant, t),
        None => HighlightFrame::empty(),
    }
}

/// Like [`highlight_frame`], with the variant supplied by the caller (for
/// example after style resolution recolored it).
pub fn highlight_frame_with(cue: &Cue, variant: &KaraokeVariant, t: f64) -> HighlightFrame {
    let Some(timings) = cue.word_timings() else {
        return HighlightFrame::empty();
    };
    let highlight_color = variant.highlight_color();
    let base_color = variant.font_color();

    if let KaraokeVariant::LetterWipe { .. } = variant {
        let units = cue
            .text
            .chars()
            .zip(letter_progress(cue, t))
            .map(|(ch, activation)| UnitHighlight {
                text: ch.to_string(),
                activation,
                highlight_color,
                base_color,
                background: None,
                scale: 1.0,
            })
            .collect();
        return HighlightFrame {
            unit: HighlightUnit::Letter,
            units,
        };
    }

    let units = timings
        .iter()
        .zip(word_activations(cue, t))
        .map(|(word, activation)| {
            let active = activation >= 1.0;
            UnitHighlight {
                text: word.text.clone(),
                activation,
                highlight_color,
                base_color,
                background: if active { variant.word_bg_color() } else { None },
                scale: if active { variant.active_scale() } else { 1.0 },
            }
        })
        .collect();

    HighlightFrame {
        unit: HighlightUnit::Word,
        units,
    }
}

/// Times inside `cue` at which the word-level highlight state changes.
///
/// Includes the cue bounds. Between two consecutive boundaries the word
/// frame is constant, which lets the exporter emit one overlay event per
/// interval instead of one per frame.
pub fn state_boundaries(cue: &Cue) -> Vec<f64> {
    let range = cue.time_range;
    let mut times = vec![range.lower, range.upper];
    if let Some(timings) = cue.word_timings() {
        for word in timings {
            times.push(word.start);
            times.push(word.end);
        }
    }
    times.retain(|t| t.is_finite() && *t >= range.lower && *t <= range.upper);
    times.sort_by(f64::total_cmp);
    times.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    times
}
