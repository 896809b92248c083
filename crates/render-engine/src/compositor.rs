//! Caption frame composition shared by the preview and the exporter.
//!
//! [`compose_caption`] is the only place a caption's on-screen state is
//! computed. The preview calls it with [`RenderPath::Preview`] for every
//! displayed frame; the ASS overlay builder calls it with
//! [`RenderPath::Export`]. Frames for the same `(cue, style, t)` differ only
//! in word spacing.

use capcue_caption_core::calibration::{spacing_for, RenderPath};
use capcue_caption_core::karaoke::{
    highlight_frame, highlight_frame_with, HighlightUnit, UnitHighlight,
};
use capcue_caption_core::style::ResolvedStyle;
use capcue_caption_model::cue::Cue;

/// A cue paired with its resolved style.
#[derive(Debug, Clone)]
pub struct StyledCue {
    pub cue: Cue,
    pub style: ResolvedStyle,
}

/// Everything a renderer needs to draw one caption at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFrame {
    /// Cue this frame belongs to.
    pub cue_id: String,

    /// Time in seconds.
    pub time_secs: f64,

    /// Render path the spacing was calibrated for.
    pub path: RenderPath,

    /// Whether `units` are words or letters.
    pub unit: HighlightUnit,

    /// Per-unit highlight state, in reading order.
    pub units: Vec<UnitHighlight>,

    /// Space between words, already calibrated for `path`.
    pub word_spacing: f64,
}

impl CaptionFrame {
    /// Text of the frame with units joined the way they are drawn.
    pub fn text(&self) -> String {
        match self.unit {
            HighlightUnit::Letter => self.units.iter().map(|u| u.text.as_str()).collect(),
            HighlightUnit::Word => self
                .units
                .iter()
                .map(|u| u.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Compose the caption for `cue` at time `t` on the given render path.
///
/// Plain cues produce one inactive unit per word, colored with the resolved
/// font color.
pub fn compose_caption(
    cue: &Cue,
    style: &ResolvedStyle,
    t: f64,
    path: RenderPath,
    base_spacing: f64,
) -> CaptionFrame {
    let frame = match (&style.karaoke, cue.is_karaoke()) {
        (Some(variant), true) => highlight_frame_with(cue, variant, t),
        _ => highlight_frame(cue, t),
    };

    let (unit, units) = if cue.is_karaoke() {
        (frame.unit, frame.units)
    } else {
        let units = cue
            .words()
            .into_iter()
            .map(|word| UnitHighlight {
                text: word.to_string(),
                activation: 0.0,
                highlight_color: style.font_color,
                base_color: style.font_color,
                background: None,
                scale: 1.0,
            })
            .collect();
        (HighlightUnit::Word, units)
    };

    CaptionFrame {
        cue_id: cue.id.clone(),
        time_secs: t,
        path,
        unit,
        units,
        word_spacing: spacing_for(cue, base_spacing, path),
    }
}

/// Cues whose time range contains `t`.
pub fn active_cues(cues: &[Cue], t: f64) -> Vec<&Cue> {
    if !t.is_finite() {
        return vec![];
    }
    cues.iter().filter(|c| c.time_range.contains(t)).collect()
}

/// Styled cues whose time range contains `t`.
pub fn active_styled_cues(cues: &[StyledCue], t: f64) -> Vec<&StyledCue> {
    if !t.is_finite() {
        return vec![];
    }
    cues.iter()
        .filter(|c| c.cue.time_range.contains(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcue_caption_core::style::{PresetCatalog, StyleResolver};
    use capcue_caption_model::color::Color;
    use capcue_caption_model::cue::KaraokeVariant;
    use capcue_caption_model::style::StyleAttributes;
    use capcue_caption_model::timing::{TimeRange, WordTiming};

    fn karaoke_cue(variant: KaraokeVariant) -> Cue {
        Cue::karaoke(
            "cue-0001",
            "Hello world",
            TimeRange::new(0.0, 1.0),
            variant,
            vec![
                WordTiming::new("Hello", 0.0, 0.5),
                WordTiming::new("world", 0.5, 1.0),
            ],
        )
    }

    fn resolve(cue: &Cue) -> ResolvedStyle {
        let catalog = PresetCatalog::builtin();
        StyleResolver::new(&catalog).resolve(cue, &StyleAttributes::default())
    }

    #[test]
    fn test_paths_differ_only_in_spacing() {
        let cue = karaoke_cue(KaraokeVariant::WordBackground {
            highlight_color: Color::WHITE,
            bg_color: Color::rgb(124, 58, 237),
            font_color: Color::WHITE,
        });
        let style = resolve(&cue);

        for t in [0.0, 0.25, 0.5, 0.99, 1.5] {
            let preview = compose_caption(&cue, &style, t, RenderPath::Preview, 4.0);
            let export = compose_caption(&cue, &style, t, RenderPath::Export, 4.0);
            assert_eq!(preview.units, export.units);
            assert_eq!(preview.unit, export.unit);
            assert_eq!(preview.word_spacing, 4.0);
            assert_eq!(export.word_spacing, 6.0);
        }
    }

    #[test]
    fn test_resolved_colors_reach_the_frame() {
        let cue = karaoke_cue(KaraokeVariant::WordHighlight {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
        })
        .with_style(StyleAttributes {
            highlight_color: Some(Color::rgb(255, 0, 0)),
            ..Default::default()
        });
        let style = resolve(&cue);

        let frame = compose_caption(&cue, &style, 0.7, RenderPath::Export, 4.0);
        assert_eq!(frame.units[1].activation, 1.0);
        assert_eq!(frame.units[1].highlight_color, Color::rgb(255, 0, 0));
        assert_eq!(frame.units[0].effective_color(), Color::WHITE);
        assert_eq!(frame.word_spacing, 12.0);
        assert_eq!(frame.text(), "Hello world");
    }

    #[test]
    fn test_plain_cue_frame() {
        let cue = Cue::plain("cue-0002", "just text", TimeRange::new(2.0, 3.0));
        let style = resolve(&cue);

        let frame = compose_caption(&cue, &style, 2.5, RenderPath::Export, 4.0);
        assert_eq!(frame.unit, HighlightUnit::Word);
        assert_eq!(frame.units.len(), 2);
        assert!(frame.units.iter().all(|u| u.activation == 0.0));
        assert_eq!(frame.word_spacing, 4.0);
    }

    #[test]
    fn test_letter_wipe_frame() {
        let cue = karaoke_cue(KaraokeVariant::LetterWipe {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
        });
        let style = resolve(&cue);

        let frame = compose_caption(&cue, &style, 0.5, RenderPath::Preview, 4.0);
        assert_eq!(frame.unit, HighlightUnit::Letter);
        assert_eq!(frame.units.len(), "Hello world".chars().count());
        assert_eq!(frame.text(), "Hello world");
    }

    #[test]
    fn test_active_cues() {
        let cues = vec![
            Cue::plain("a", "one", TimeRange::new(0.0, 1.0)),
            Cue::plain("b", "two", TimeRange::new(1.0, 2.0)),
        ];
        let ids = |t: f64| {
            active_cues(&cues, t)
                .into_iter()
                .map(|c| c.id.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(0.5), vec!["a"]);
        assert_eq!(ids(1.0), vec!["b"]);
        assert!(ids(2.0).is_empty());
        assert!(ids(f64::NAN).is_empty());
    }
}
