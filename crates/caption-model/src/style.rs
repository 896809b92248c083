//! Explicit style attributes attached to cues and presets.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A sparse set of visual attributes.
///
/// `None` means "not set here", so a more general layer (preset, defaults)
/// decides. Cues, caller overrides and presets all use this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_bg_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_spacing: Option<f64>,
}

impl StyleAttributes {
    /// Merge field by field: values set on `self` win, unset fields come
    /// from `base`.
    pub fn layer_over(&self, base: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            font_name: self.font_name.clone().or_else(|| base.font_name.clone()),
            font_size: self.font_size.or(base.font_size),
            font_color: self.font_color.or(base.font_color),
            stroke_color: self.stroke_color.or(base.stroke_color),
            stroke_width: self.stroke_width.or(base.stroke_width),
            shadow_color: self.shadow_color.or(base.shadow_color),
            shadow_radius: self.shadow_radius.or(base.shadow_radius),
            background_color: self.background_color.or(base.background_color),
            background_padding: self.background_padding.or(base.background_padding),
            corner_radius: self.corner_radius.or(base.corner_radius),
            highlight_color: self.highlight_color.or(base.highlight_color),
            word_bg_color: self.word_bg_color.or(base.word_bg_color),
            word_spacing: self.word_spacing.or(base.word_spacing),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StyleAttributes::default()
    }
}
