//! Style presets and style resolution.
//!
//! The session's [`PresetCatalog`] is built once from the built-in presets
//! and an optional remote feed, then passed by reference to a
//! [`StyleResolver`]. Resolution order, highest priority first:
//!
//! 1. Caller overrides, then attributes set explicitly on the cue
//! 2. The cue's named preset (karaoke presets also supply highlight colors)
//! 3. Hard-coded defaults
//!
//! Preset names are persisted in projects. Renaming a built-in preset breaks
//! existing projects unless an alias maps the old name to the new one.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use capcue_common::error::{CapcueError, CapcueResult};
use capcue_caption_model::color::Color;
use capcue_caption_model::cue::{Cue, KaraokeVariant};
use capcue_caption_model::style::StyleAttributes;
use serde::{Deserialize, Serialize};

/// A named, immutable bundle of default style attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    pub name: String,

    #[serde(flatten)]
    pub attributes: StyleAttributes,

    /// Whether the preset is meant for karaoke cues.
    #[serde(default)]
    pub is_karaoke_preset: bool,

    /// Highlight color filled in for karaoke cues that do not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karaoke_highlight_color: Option<Color>,

    /// Word background color filled in for karaoke cues that do not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karaoke_word_bg_color: Option<Color>,
}

impl StylePreset {
    /// Attributes this preset contributes, karaoke defaults included.
    pub fn effective_attributes(&self) -> StyleAttributes {
        if !self.is_karaoke_preset {
            return self.attributes.clone();
        }
        StyleAttributes {
            highlight_color: self.karaoke_highlight_color,
            word_bg_color: self.karaoke_word_bg_color,
            ..StyleAttributes::default()
        }
        .layer_over(&self.attributes)
    }
}

/// Remote preset configuration: additions/replacements plus exclusions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemotePresetFeed {
    #[serde(default)]
    pub presets: Vec<StylePreset>,

    #[serde(default)]
    pub excluded: BTreeSet<String>,
}

impl RemotePresetFeed {
    pub fn from_json(json: &str) -> CapcueResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CapcueError::config(format!("Invalid preset feed: {e}")))
    }

    pub fn load(path: &Path) -> CapcueResult<Self> {
        if !path.exists() {
            return Err(CapcueError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// The presets available for the rest of an editing session.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Arc<StylePreset>>,
    aliases: HashMap<String, String>,
}

impl PresetCatalog {
    /// Catalog with only the built-in presets.
    pub fn builtin() -> Self {
        Self::from_presets(builtin_presets())
    }

    pub fn from_presets(presets: Vec<StylePreset>) -> Self {
        Self {
            presets: presets.into_iter().map(Arc::new).collect(),
            aliases: HashMap::new(),
        }
    }

    /// Built-ins ⊕ remote additions/replacements − remote exclusions.
    pub fn merged(builtins: Vec<StylePreset>, feed: &RemotePresetFeed) -> Self {
        let mut presets = builtins;
        let mut replaced = 0;
        let mut added = 0;

        for remote in &feed.presets {
            match presets.iter_mut().find(|p| p.name == remote.name) {
                Some(slot) => {
                    *slot = remote.clone();
                    replaced += 1;
                }
                None => {
                    presets.push(remote.clone());
                    added += 1;
                }
            }
        }

        let before = presets.len();
        presets.retain(|p| !feed.excluded.contains(&p.name));

        tracing::info!(
            presets = presets.len(),
            replaced,
            added,
            excluded = before - presets.len(),
            "Merged remote preset feed"
        );
        Self::from_presets(presets)
    }

    /// Map a retired preset name onto its replacement.
    pub fn with_alias(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.aliases.insert(old.into(), new.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<StylePreset>> {
        let find = |n: &str| self.presets.iter().find(|p| p.name == n);
        find(name).or_else(|| self.aliases.get(name).and_then(|n| find(n)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<StylePreset>> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Fully resolved visual style for a cue.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font_name: String,
    pub font_size: f64,
    pub font_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub shadow_color: Color,
    pub shadow_radius: f64,
    pub background_color: Color,
    pub background_padding: f64,
    pub corner_radius: f64,
    pub highlight_color: Color,
    pub word_bg_color: Color,
    pub word_spacing: f64,
    /// The cue's karaoke variant, recolored by the resolved attributes.
    pub karaoke: Option<KaraokeVariant>,
    /// Name of the preset that contributed, if it was found.
    pub preset: Option<String>,
}

/// Hard-coded fallbacks used when neither the cue nor its preset sets a value.
pub fn default_attributes() -> StyleAttributes {
    StyleAttributes {
        font_name: Some("Helvetica".to_string()),
        font_size: Some(36.0),
        font_color: Some(Color::WHITE),
        stroke_color: Some(Color::BLACK),
        stroke_width: Some(0.0),
        shadow_color: Some(Color::rgba(0, 0, 0, 128)),
        shadow_radius: Some(0.0),
        background_color: Some(Color::TRANSPARENT),
        background_padding: Some(8.0),
        corner_radius: Some(8.0),
        highlight_color: Some(Color::YELLOW),
        word_bg_color: Some(Color::TRANSPARENT),
        word_spacing: Some(4.0),
    }
}

/// Resolves cue styles against a preset catalog.
pub struct StyleResolver<'a> {
    catalog: &'a PresetCatalog,
    defaults: StyleAttributes,
}

impl<'a> StyleResolver<'a> {
    pub fn new(catalog: &'a PresetCatalog) -> Self {
        Self {
            catalog,
            defaults: default_attributes(),
        }
    }

    /// Replace the hard defaults layered under every cue.
    pub fn with_defaults(mut self, defaults: StyleAttributes) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn catalog(&self) -> &PresetCatalog {
        self.catalog
    }

    /// Resolve the style of `cue`, with `overrides` taking top priority.
    pub fn resolve(&self, cue: &Cue, overrides: &StyleAttributes) -> ResolvedStyle {
        let explicit = overrides.layer_over(&cue.style);

        let preset = cue.preset_name.as_deref().and_then(|name| {
            let found = self.catalog.get(name);
            if found.is_none() {
                tracing::warn!(
                    cue = %cue.id,
                    preset = name,
                    "Preset not found, falling back to default style"
                );
            }
            found
        });

        let layered = match preset {
            Some(preset) => explicit.layer_over(&preset.effective_attributes()),
            None => explicit,
        };

        let karaoke = cue.variant().map(|variant| {
            variant.with_colors(
                layered.highlight_color,
                layered.font_color,
                layered.word_bg_color,
            )
        });

        let full = layered.layer_over(&self.defaults);
        let fallback = &self.defaults;
        let num = |value: Option<f64>, default: Option<f64>| {
            value
                .filter(|v| v.is_finite())
                .or(default)
                .unwrap_or_default()
        };

        ResolvedStyle {
            font_name: full
                .font_name
                .clone()
                .or(fallback.font_name.clone())
                .unwrap_or_default(),
            font_size: num(full.font_size, fallback.font_size),
            font_color: karaoke
                .map(|k| k.font_color())
                .or(full.font_color)
                .unwrap_or(Color::WHITE),
            stroke_color: full.stroke_color.unwrap_or(Color::BLACK),
            stroke_width: num(full.stroke_width, fallback.stroke_width),
            shadow_color: full.shadow_color.unwrap_or(Color::BLACK),
            shadow_radius: num(full.shadow_radius, fallback.shadow_radius),
            background_color: full.background_color.unwrap_or(Color::TRANSPARENT),
            background_padding: num(full.background_padding, fallback.background_padding),
            corner_radius: num(full.corner_radius, fallback.corner_radius),
            highlight_color: karaoke
                .map(|k| k.highlight_color())
                .or(full.highlight_color)
                .unwrap_or(Color::YELLOW),
            word_bg_color: karaoke
                .and_then(|k| k.word_bg_color())
                .or(full.word_bg_color)
                .unwrap_or(Color::TRANSPARENT),
            word_spacing: num(full.word_spacing, fallback.word_spacing),
            karaoke,
            preset: preset.map(|p| p.name.clone()),
        }
    }
}

/// Presets shipped with the application.
pub fn builtin_presets() -> Vec<StylePreset> {
    vec![
        StylePreset {
            name: "Classic".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Helvetica".to_string()),
                font_size: Some(36.0),
                font_color: Some(Color::WHITE),
                stroke_color: Some(Color::BLACK),
                stroke_width: Some(2.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: false,
            karaoke_highlight_color: None,
            karaoke_word_bg_color: None,
        },
        StylePreset {
            name: "Boxed".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Helvetica".to_string()),
                font_size: Some(32.0),
                font_color: Some(Color::WHITE),
                background_color: Some(Color::rgba(0, 0, 0, 180)),
                background_padding: Some(12.0),
                corner_radius: Some(10.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: false,
            karaoke_highlight_color: None,
            karaoke_word_bg_color: None,
        },
        StylePreset {
            name: "Karaoke Yellow".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Montserrat".to_string()),
                font_size: Some(44.0),
                font_color: Some(Color::WHITE),
                stroke_color: Some(Color::BLACK),
                stroke_width: Some(3.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: true,
            karaoke_highlight_color: Some(Color::YELLOW),
            karaoke_word_bg_color: None,
        },
        StylePreset {
            name: "Karaoke Box".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Montserrat".to_string()),
                font_size: Some(42.0),
                font_color: Some(Color::WHITE),
                corner_radius: Some(6.0),
                background_padding: Some(6.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: true,
            karaoke_highlight_color: Some(Color::WHITE),
            karaoke_word_bg_color: Some(Color::rgb(124, 58, 237)),
        },
        StylePreset {
            name: "Bold Pop".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Impact".to_string()),
                font_size: Some(56.0),
                font_color: Some(Color::WHITE),
                stroke_color: Some(Color::BLACK),
                stroke_width: Some(4.0),
                shadow_color: Some(Color::rgba(0, 0, 0, 160)),
                shadow_radius: Some(4.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: true,
            karaoke_highlight_color: Some(Color::rgb(0, 230, 118)),
            karaoke_word_bg_color: None,
        },
        StylePreset {
            name: "Neon".to_string(),
            attributes: StyleAttributes {
                font_name: Some("Montserrat".to_string()),
                font_size: Some(40.0),
                font_color: Some(Color::rgb(230, 230, 255)),
                shadow_color: Some(Color::rgb(255, 0, 200)),
                shadow_radius: Some(8.0),
                ..StyleAttributes::default()
            },
            is_karaoke_preset: true,
            karaoke_highlight_color: Some(Color::rgb(255, 0, 200)),
            karaoke_word_bg_color: None,
        },
    ]
}
