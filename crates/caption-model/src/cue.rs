//! Timed caption cues and karaoke variants.
//!
//! A cue either carries no karaoke data at all or carries both a variant
//! and its word timings. The pair lives behind a single private field so
//! the two can only be set and cleared together.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::style::StyleAttributes;
use crate::timing::{even_word_timings, TimeRange, WordTiming};

/// Unique identifier for a cue.
pub type CueId = String;

/// Default scale applied to the active word by [`KaraokeVariant::WordAndScale`].
pub const DEFAULT_SCALE_FACTOR: f64 = 1.2;

fn default_scale_factor() -> f64 {
    DEFAULT_SCALE_FACTOR
}

/// Word/letter highlight animation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KaraokeVariant {
    /// Active word drawn in `highlight_color`, others in `font_color`.
    WordHighlight {
        highlight_color: Color,
        font_color: Color,
    },
    /// Active word gets a `bg_color` box behind it and `highlight_color` text.
    WordBackground {
        highlight_color: Color,
        bg_color: Color,
        font_color: Color,
    },
    /// Like `WordHighlight`, with the active word scaled by `scale_factor`.
    WordAndScale {
        highlight_color: Color,
        font_color: Color,
        #[serde(default = "default_scale_factor")]
        scale_factor: f64,
    },
    /// Linear left-to-right wipe across the letters of the whole cue.
    LetterWipe {
        highlight_color: Color,
        font_color: Color,
    },
}

/// Discriminant of [`KaraokeVariant`] without its colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    WordHighlight,
    WordBackground,
    WordAndScale,
    LetterWipe,
}

impl KaraokeVariant {
    pub fn kind(&self) -> VariantKind {
        match self {
            KaraokeVariant::WordHighlight { .. } => VariantKind::WordHighlight,
            KaraokeVariant::WordBackground { .. } => VariantKind::WordBackground,
            KaraokeVariant::WordAndScale { .. } => VariantKind::WordAndScale,
            KaraokeVariant::LetterWipe { .. } => VariantKind::LetterWipe,
        }
    }

    pub fn highlight_color(&self) -> Color {
        match *self {
            KaraokeVariant::WordHighlight {
                highlight_color, ..
            }
            | KaraokeVariant::WordBackground {
                highlight_color, ..
            }
            | KaraokeVariant::WordAndScale {
                highlight_color, ..
            }
            | KaraokeVariant::LetterWipe {
                highlight_color, ..
            } => highlight_color,
        }
    }

    pub fn font_color(&self) -> Color {
        match *self {
            KaraokeVariant::WordHighlight { font_color, .. }
            | KaraokeVariant::WordBackground { font_color, .. }
            | KaraokeVariant::WordAndScale { font_color, .. }
            | KaraokeVariant::LetterWipe { font_color, .. } => font_color,
        }
    }

    /// Background box color for the active word, if the variant draws one.
    pub fn word_bg_color(&self) -> Option<Color> {
        match *self {
            KaraokeVariant::WordBackground { bg_color, .. } => Some(bg_color),
            _ => None,
        }
    }

    /// Scale applied to the active word.
    pub fn active_scale(&self) -> f64 {
        match *self {
            KaraokeVariant::WordAndScale { scale_factor, .. } if scale_factor.is_finite() => {
                scale_factor.max(0.0)
            }
            KaraokeVariant::WordAndScale { .. } => DEFAULT_SCALE_FACTOR,
            _ => 1.0,
        }
    }

    /// Copy of this variant with its colors replaced where given.
    pub fn with_colors(
        &self,
        highlight: Option<Color>,
        font: Option<Color>,
        word_bg: Option<Color>,
    ) -> KaraokeVariant {
        let highlight_color = highlight.unwrap_or_else(|| self.highlight_color());
        let font_color = font.unwrap_or_else(|| self.font_color());
        match *self {
            KaraokeVariant::WordHighlight { .. } => KaraokeVariant::WordHighlight {
                highlight_color,
                font_color,
            },
            KaraokeVariant::WordBackground { bg_color, .. } => KaraokeVariant::WordBackground {
                highlight_color,
                bg_color: word_bg.unwrap_or(bg_color),
                font_color,
            },
            KaraokeVariant::WordAndScale { scale_factor, .. } => KaraokeVariant::WordAndScale {
                highlight_color,
                font_color,
                scale_factor,
            },
            KaraokeVariant::LetterWipe { .. } => KaraokeVariant::LetterWipe {
                highlight_color,
                font_color,
            },
        }
    }
}

/// Karaoke data: a variant together with the timings it animates.
#[derive(Debug, Clone, PartialEq)]
pub struct Karaoke {
    pub variant: KaraokeVariant,
    pub word_timings: Vec<WordTiming>,
}

/// A single timed caption entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CueRecord", into = "CueRecord")]
pub struct Cue {
    pub id: CueId,
    pub text: String,
    pub time_range: TimeRange,
    /// Attributes the user set explicitly on this cue.
    pub style: StyleAttributes,
    /// Stable name of the preset this cue uses.
    pub preset_name: Option<String>,
    karaoke: Option<Karaoke>,
}

impl Cue {
    /// A plain styled caption with no karaoke data.
    pub fn plain(id: impl Into<CueId>, text: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            time_range,
            style: StyleAttributes::default(),
            preset_name: None,
            karaoke: None,
        }
    }

    /// A karaoke caption animating `word_timings` with `variant`.
    pub fn karaoke(
        id: impl Into<CueId>,
        text: impl Into<String>,
        time_range: TimeRange,
        variant: KaraokeVariant,
        word_timings: Vec<WordTiming>,
    ) -> Self {
        let mut cue = Self::plain(id, text, time_range);
        cue.set_karaoke(variant, word_timings);
        cue
    }

    pub fn with_preset(mut self, name: impl Into<String>) -> Self {
        self.preset_name = Some(name.into());
        self
    }

    pub fn with_style(mut self, style: StyleAttributes) -> Self {
        self.style = style;
        self
    }

    pub fn karaoke_data(&self) -> Option<&Karaoke> {
        self.karaoke.as_ref()
    }

    pub fn variant(&self) -> Option<&KaraokeVariant> {
        self.karaoke.as_ref().map(|k| &k.variant)
    }

    pub fn word_timings(&self) -> Option<&[WordTiming]> {
        self.karaoke.as_ref().map(|k| k.word_timings.as_slice())
    }

    pub fn is_karaoke(&self) -> bool {
        self.karaoke.is_some()
    }

    /// Words of the cue text, split on whitespace.
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }

    /// Attach karaoke data. An empty timing list falls back to even timings.
    pub fn set_karaoke(&mut self, variant: KaraokeVariant, word_timings: Vec<WordTiming>) {
        let word_timings = if word_timings.is_empty() {
            even_word_timings(&self.words(), self.time_range)
        } else {
            word_timings
        };
        self.karaoke = Some(Karaoke {
            variant,
            word_timings,
        });
    }

    /// Switch to (or change) a karaoke variant, keeping existing timings.
    pub fn enable_karaoke(&mut self, variant: KaraokeVariant) {
        let timings = self
            .karaoke
            .take()
            .map(|k| k.word_timings)
            .unwrap_or_default();
        self.set_karaoke(variant, timings);
    }

    /// Drop both the variant and the word timings.
    pub fn clear_karaoke(&mut self) {
        self.karaoke = None;
    }
}

/// On-disk shape of a cue.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CueRecord {
    id: CueId,
    text: String,
    time_range: TimeRange,
    #[serde(flatten)]
    style: StyleAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word_timings: Option<Vec<WordTiming>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    karaoke: Option<KaraokeVariant>,
}

impl From<CueRecord> for Cue {
    fn from(record: CueRecord) -> Self {
        let mut cue = Cue {
            id: record.id,
            text: record.text,
            time_range: record.time_range,
            style: record.style,
            preset_name: record.preset_name,
            karaoke: None,
        };
        match (record.karaoke, record.word_timings) {
            (Some(variant), Some(timings)) if !timings.is_empty() => {
                cue.set_karaoke(variant, timings);
            }
            (Some(variant), _) => {
                tracing::warn!(
                    cue = %cue.id,
                    "Karaoke cue has no word timings, regenerating evenly"
                );
                cue.set_karaoke(variant, vec![]);
            }
            (None, Some(timings)) if !timings.is_empty() => {
                tracing::warn!(
                    cue = %cue.id,
                    words = timings.len(),
                    "Dropping word timings of cue without karaoke variant"
                );
            }
            (None, _) => {}
        }
        cue
    }
}

impl From<Cue> for CueRecord {
    fn from(cue: Cue) -> Self {
        let (karaoke, word_timings) = match cue.karaoke {
            Some(k) => (Some(k.variant), Some(k.word_timings)),
            None => (None, None),
        };
        CueRecord {
            id: cue.id,
            text: cue.text,
            time_range: cue.time_range,
            style: cue.style,
            preset_name: cue.preset_name,
            word_timings,
            karaoke,
        }
    }
}
