//! Render parity calibration.
//!
//! The export compositor draws word spacing smaller than the preview for the
//! same nominal value. Export spacing is scaled per karaoke variant so both
//! paths look the same. The factors were measured against exported frames.

use capcue_caption_model::cue::{Cue, VariantKind};

/// Multiplier for the word background variant.
pub const BACKGROUND_SPACING_MULTIPLIER: f64 = 1.5;

/// Multiplier for the highlight-only, scale and letter wipe variants.
pub const HIGHLIGHT_SPACING_MULTIPLIER: f64 = 3.0;

/// Where a caption is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Live preview while editing.
    Preview,
    /// Offline compositing into the exported video.
    Export,
}

/// Export multiplier for a cue of the given variant (`None` for plain cues).
pub fn spacing_multiplier(variant: Option<VariantKind>) -> f64 {
    match variant {
        Some(VariantKind::WordBackground) => BACKGROUND_SPACING_MULTIPLIER,
        Some(VariantKind::WordHighlight | VariantKind::WordAndScale | VariantKind::LetterWipe) => {
            HIGHLIGHT_SPACING_MULTIPLIER
        }
        None => 1.0,
    }
}

/// Spacing to draw with on `path`, from the nominal `base` spacing.
///
/// Negative or non-finite bases are treated as zero.
pub fn calibrated_spacing(base: f64, variant: Option<VariantKind>, path: RenderPath) -> f64 {
    let base = if base.is_finite() { base.max(0.0) } else { 0.0 };
    match path {
        RenderPath::Preview => base,
        RenderPath::Export => base * spacing_multiplier(variant),
    }
}

/// [`calibrated_spacing`] for a cue.
pub fn spacing_for(cue: &Cue, base: f64, path: RenderPath) -> f64 {
    calibrated_spacing(base, cue.variant().map(|v| v.kind()), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcue_caption_model::color::Color;
    use capcue_caption_model::cue::KaraokeVariant;
    use capcue_caption_model::timing::{TimeRange, WordTiming};

    #[test]
    fn test_export_multipliers() {
        assert_eq!(
            calibrated_spacing(4.0, Some(VariantKind::WordBackground), RenderPath::Export),
            6.0
        );
        assert_eq!(
            calibrated_spacing(4.0, Some(VariantKind::WordHighlight), RenderPath::Export),
            12.0
        );
        assert_eq!(
            calibrated_spacing(4.0, Some(VariantKind::WordAndScale), RenderPath::Export),
            12.0
        );
        assert_eq!(
            calibrated_spacing(4.0, Some(VariantKind::LetterWipe), RenderPath::Export),
            12.0
        );
        assert_eq!(calibrated_spacing(4.0, None, RenderPath::Export), 4.0);
    }

    #[test]
    fn test_preview_is_unscaled() {
        for kind in [
            Some(VariantKind::WordBackground),
            Some(VariantKind::WordHighlight),
            None,
        ] {
            assert_eq!(calibrated_spacing(5.0, kind, RenderPath::Preview), 5.0);
        }
    }

    #[test]
    fn test_invalid_base_clamps_to_zero() {
        let kind = Some(VariantKind::WordHighlight);
        assert_eq!(calibrated_spacing(-2.0, kind, RenderPath::Export), 0.0);
        assert_eq!(calibrated_spacing(f64::NAN, kind, RenderPath::Export), 0.0);
        assert_eq!(calibrated_spacing(0.0, kind, RenderPath::Export), 0.0);
    }

    #[test]
    fn test_spacing_for_cue() {
        let range = TimeRange::new(0.0, 1.0);
        let plain = Cue::plain("a", "hi", range);
        let karaoke = Cue::karaoke(
            "b",
            "hi",
            range,
            KaraokeVariant::WordBackground {
                highlight_color: Color::WHITE,
                bg_color: Color::BLACK,
                font_color: Color::WHITE,
            },
            vec![WordTiming::new("hi", 0.0, 1.0)],
        );
        assert_eq!(spacing_for(&plain, 4.0, RenderPath::Export), 4.0);
        assert_eq!(spacing_for(&karaoke, 4.0, RenderPath::Export), 6.0);
    }
}
