//! ASS subtitle overlay generation for the ffmpeg compositor.
//!
//! Each cue gets its own ASS style built from its resolved style. The cue is
//! then split into intervals over which its caption frame is constant and
//! one `Dialogue` event is written per interval, with the frame produced by
//! [`compose_caption`] on the export path. Word-level cues change state only
//! at word boundaries. Letter wipes are written as a single event whose
//! `\kf` fill timings are the engine's [`letter_windows`], so the renderer
//! sweeps each letter linearly between frames just like the preview.

use capcue_caption_core::calibration::RenderPath;
use capcue_caption_core::karaoke::{letter_windows, state_boundaries, HighlightUnit};
use capcue_caption_core::style::ResolvedStyle;
use capcue_caption_model::cue::{Cue, KaraokeVariant};
use capcue_common::clock::{format_timecode, TimecodeStyle};

use crate::compositor::{compose_caption, CaptionFrame, StyledCue};

/// Bottom margin for captions, in output pixels.
const CAPTION_MARGIN_V: u32 = 60;

/// Builds an ASS script for a set of styled cues.
#[derive(Debug, Clone)]
pub struct AssOverlay {
    width: u32,
    height: u32,
    base_spacing: f64,
}

impl AssOverlay {
    pub fn new(width: u32, height: u32, base_spacing: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            base_spacing,
        }
    }

    /// Render the complete script.
    pub fn render(&self, cues: &[StyledCue]) -> String {
        let mut out = String::new();
        out.push_str("[Script Info]\n");
        out.push_str("ScriptType: v4.00+\n");
        out.push_str(&format!("PlayResX: {}\n", self.width));
        out.push_str(&format!("PlayResY: {}\n", self.height));
        out.push_str("WrapStyle: 2\n");
        out.push_str("ScaledBorderAndShadow: yes\n\n");

        out.push_str("[V4+ Styles]\n");
        out.push_str(
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
             BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
             BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
        );
        for styled in cues {
            out.push_str(&style_line(&styled.cue.id, &styled.style));
        }

        out.push_str("\n[Events]\n");
        out.push_str(
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        );
        let mut events = 0usize;
        for styled in cues {
            for line in self.dialogue_lines(styled) {
                out.push_str(&line);
                events += 1;
            }
        }

        tracing::debug!(cues = cues.len(), events, "Built ASS overlay");
        out
    }

    /// Times at which the caption for `cue` must be re-sampled, including
    /// the cue's end.
    pub fn sample_times(&self, cue: &Cue) -> Vec<f64> {
        let range = cue.time_range;
        if !range.is_valid() {
            return vec![];
        }
        let mut times = match cue.variant() {
            Some(KaraokeVariant::LetterWipe { .. }) | None => vec![range.lower],
            Some(_) => state_boundaries(cue),
        };
        times.push(range.upper);
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        times
    }

    fn dialogue_lines(&self, styled: &StyledCue) -> Vec<String> {
        let times = self.sample_times(&styled.cue);
        times
            .windows(2)
            .filter(|w| w[1] > w[0])
            .map(|w| {
                let frame = compose_caption(
                    &styled.cue,
                    &styled.style,
                    w[0],
                    RenderPath::Export,
                    self.base_spacing,
                );
                let text = match frame.unit {
                    HighlightUnit::Letter => {
                        letter_wipe_text(&frame, &letter_windows(&styled.cue), w[0])
                    }
                    HighlightUnit::Word => frame_text(&frame, &styled.style),
                };
                format!(
                    "Dialogue: 0,{},{},{},,0,0,0,,{}\n",
                    format_timecode(w[0], TimecodeStyle::Ass),
                    format_timecode(w[1], TimecodeStyle::Ass),
                    styled.cue.id,
                    text,
                )
            })
            .collect()
    }
}

fn style_line(name: &str, style: &ResolvedStyle) -> String {
    let boxed = style.background_color.a > 0;
    let (border_style, outline, outline_color) = if boxed {
        (3, style.background_padding, style.background_color)
    } else {
        (1, style.stroke_width, style.stroke_color)
    };
    let back_color = if boxed {
        style.background_color
    } else {
        style.shadow_color
    };

    format!(
        "Style: {name},{font},{size},{primary},{secondary},{outline_color},{back},0,0,0,0,100,100,0,0,{border_style},{outline},{shadow},2,10,10,{margin},1\n",
        font = style.font_name,
        size = fmt_num(style.font_size),
        primary = style.font_color.to_ass_color(),
        secondary = style.highlight_color.to_ass_color(),
        outline_color = outline_color.to_ass_color(),
        back = back_color.to_ass_color(),
        outline = fmt_num(outline),
        shadow = fmt_num(style.shadow_radius),
        margin = CAPTION_MARGIN_V,
    )
}

/// ASS dialogue text for one word-level caption frame.
pub fn frame_text(frame: &CaptionFrame, style: &ResolvedStyle) -> String {
    let mut text = String::new();
    let spacer = format!("{{\\fsp{}}} {{\\fsp0}}", fmt_num(frame.word_spacing));

    for (i, unit) in frame.units.iter().enumerate() {
        if i > 0 && frame.unit == HighlightUnit::Word {
            text.push_str(&spacer);
        }
        let color = unit.effective_color();
        text.push_str(&format!(
            "{{\\1c{}\\1a{}",
            color.to_ass_inline(),
            color.to_ass_alpha()
        ));
        // ASS has no per-word box: a wide outline in the box color under
        // BorderStyle 1 stands in for the rounded background of the preview.
        if let Some(bg) = unit.background {
            text.push_str(&format!(
                "\\bord{}\\3c{}\\3a{}",
                fmt_num(style.background_padding.max(1.0)),
                bg.to_ass_inline(),
                bg.to_ass_alpha()
            ));
        }
        if (unit.scale - 1.0).abs() > f64::EPSILON {
            let percent = fmt_num(unit.scale * 100.0);
            text.push_str(&format!("\\fscx{percent}\\fscy{percent}"));
        }
        text.push('}');
        text.push_str(&escape(&unit.text));
        if unit.background.is_some() || (unit.scale - 1.0).abs() > f64::EPSILON {
            text.push_str("{\\r}");
        }
    }
    text
}

/// ASS text for a letter wipe starting at `origin`.
///
/// Letters are drawn in the base color (`\2c`) and filled left to right with
/// the highlight color (`\1c`) over their window. The windows tile the cue
/// from `origin`; durations are differences of rounded centisecond offsets so
/// rounding never drifts.
pub fn letter_wipe_text(frame: &CaptionFrame, windows: &[(f64, f64)], origin: f64) -> String {
    let Some(first) = frame.units.first() else {
        return String::new();
    };
    let mut text = format!(
        "{{\\1c{}\\1a{}\\2c{}\\2a{}}}",
        first.highlight_color.to_ass_inline(),
        first.highlight_color.to_ass_alpha(),
        first.base_color.to_ass_inline(),
        first.base_color.to_ass_alpha(),
    );
    let centis = |t: f64| ((t - origin).max(0.0) * 100.0).round() as i64;

    for (unit, &(start, end)) in frame.units.iter().zip(windows) {
        let fill = (centis(end) - centis(start)).max(0);
        text.push_str(&format!("{{\\kf{fill}}}"));
        text.push_str(&escape(&unit.text));
    }
    text
}

fn escape(text: &str) -> String {
    text.replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}

fn fmt_num(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcue_caption_core::karaoke::letter_progress;
    use capcue_caption_core::style::{PresetCatalog, StyleResolver};
    use capcue_caption_model::color::Color;
    use capcue_caption_model::style::StyleAttributes;
    use capcue_caption_model::timing::{TimeRange, WordTiming};

    fn styled(cue: Cue) -> StyledCue {
        let catalog = PresetCatalog::builtin();
        let style = StyleResolver::new(&catalog).resolve(&cue, &StyleAttributes::default());
        StyledCue { cue, style }
    }

    fn hello(variant: KaraokeVariant) -> Cue {
        Cue::karaoke(
            "cue-0001",
            "Hello world",
            TimeRange::new(0.0, 1.0),
            variant,
            vec![
                WordTiming::new("Hello", 0.0, 0.4),
                WordTiming::new("world", 0.5, 1.0),
            ],
        )
    }

    #[test]
    fn test_word_cue_events_follow_word_boundaries() {
        let overlay = AssOverlay::new(1920, 1080, 4.0);
        let cue = hello(KaraokeVariant::WordHighlight {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
        });
        assert_eq!(overlay.sample_times(&cue), vec![0.0, 0.4, 0.5, 1.0]);

        let script = overlay.render(&[styled(cue)]);
        let events: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .collect();
        assert_eq!(events.len(), 3);
        assert!(events[0].starts_with("Dialogue: 0,0:00:00.00,0:00:00.40,cue-0001,"));
        // First word highlighted in yellow, second in white.
        assert!(events[0].contains("{\\1c&H00FFFF&\\1a&H00&}Hello"));
        assert!(events[0].contains("{\\1c&HFFFFFF&\\1a&H00&}world"));
        // Gap between words: nothing active.
        assert!(events[1].contains("{\\1c&HFFFFFF&\\1a&H00&}Hello"));
        // Export spacing for highlight cues is tripled.
        assert!(events[0].contains("{\\fsp12} {\\fsp0}"));
    }

    /// Fill of each letter at `t` as a karaoke renderer computes it from the
    /// `\kf` durations of one event starting at `origin`.
    fn kf_fill_at(text: &str, origin: f64, t: f64) -> Vec<f64> {
        let mut elapsed = 0.0;
        text.split("{\\kf")
            .skip(1)
            .map(|part| {
                let centis: f64 = part.split('}').next().unwrap().parse().unwrap();
                let start = origin + elapsed / 100.0;
                let duration = centis / 100.0;
                elapsed += centis;
                ((t - start) / duration).clamp(0.0, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_letter_wipe_fills_letters_linearly() {
        let overlay = AssOverlay::new(1280, 720, 4.0);
        let cue = Cue::karaoke(
            "cue-0002",
            "ab",
            TimeRange::new(0.0, 2.0),
            KaraokeVariant::LetterWipe {
                highlight_color: Color::YELLOW,
                font_color: Color::WHITE,
            },
            vec![WordTiming::new("ab", 0.0, 2.0)],
        );
        assert_eq!(overlay.sample_times(&cue), vec![0.0, 2.0]);

        let script = overlay.render(&[styled(cue.clone())]);
        let events: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].ends_with(
            "{\\1c&H00FFFF&\\1a&H00&\\2c&HFFFFFF&\\2a&H00&}{\\kf100}a{\\kf100}b"
        ));
        assert!(!script.contains("\\fsp"));

        // A letter 40% of the way through its window is drawn 40% filled.
        for t in [0.4, 1.3, 1.95] {
            let rendered = kf_fill_at(events[0], 0.0, t);
            let expected = letter_progress(&cue, t);
            assert_eq!(rendered.len(), expected.len());
            for (r, e) in rendered.iter().zip(&expected) {
                assert!((r - e).abs() < 1e-9, "t={t}: {rendered:?} vs {expected:?}");
            }
        }
        assert!((kf_fill_at(events[0], 0.0, 0.4)[0] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_letter_wipe_durations_do_not_drift() {
        let wipe = styled(Cue::karaoke(
            "c",
            "abc",
            TimeRange::new(0.0, 1.0),
            KaraokeVariant::LetterWipe {
                highlight_color: Color::YELLOW,
                font_color: Color::WHITE,
            },
            vec![],
        ));
        let frame = compose_caption(&wipe.cue, &wipe.style, 0.0, RenderPath::Export, 4.0);
        let text = letter_wipe_text(&frame, &letter_windows(&wipe.cue), 0.0);
        assert!(text.ends_with("{\\kf33}a{\\kf34}b{\\kf33}c"));
    }

    #[test]
    fn test_background_and_scale_overrides() {
        let background = styled(hello(KaraokeVariant::WordBackground {
            highlight_color: Color::WHITE,
            bg_color: Color::rgb(255, 0, 0),
            font_color: Color::WHITE,
        }));
        let frame = compose_caption(
            &background.cue,
            &background.style,
            0.1,
            RenderPath::Export,
            4.0,
        );
        let text = frame_text(&frame, &background.style);
        // Box approximated by a padding-wide outline in the box color.
        assert!(text.contains("\\bord8\\3c&H0000FF&\\3a&H00&"));
        assert!(text.contains("Hello{\\r}"));

        let scaled = styled(hello(KaraokeVariant::WordAndScale {
            highlight_color: Color::YELLOW,
            font_color: Color::WHITE,
            scale_factor: 1.2,
        }));
        let frame = compose_caption(&scaled.cue, &scaled.style, 0.6, RenderPath::Export, 4.0);
        assert!(frame_text(&frame, &scaled.style).contains("\\fscx120\\fscy120"));
    }

    #[test]
    fn test_style_line_uses_resolved_style() {
        let cue = Cue::plain("cue-0009", "plain", TimeRange::new(0.0, 1.0)).with_preset("Boxed");
        let s = styled(cue);
        let line = style_line(&s.cue.id, &s.style);
        assert!(line.starts_with("Style: cue-0009,Helvetica,32,&H00FFFFFF,"));
        assert!(line.contains(",3,12,"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a{b}\nc"), "a\\{b\\}\\Nc");
    }
}
