//! Show the caption frames visible at a point in time.

use std::path::PathBuf;

use capcue_caption_core::calibration::RenderPath;
use capcue_caption_core::style::StyleResolver;
use capcue_caption_model::style::StyleAttributes;
use capcue_common::config::AppConfig;
use capcue_render_engine::compositor::{active_cues, compose_caption};

pub fn run(config: &AppConfig, path: PathBuf, time: f64, json: bool) -> anyhow::Result<()> {
    let project = super::load_project(&path)?;
    let catalog = super::load_catalog(config, None);
    let resolver = StyleResolver::new(&catalog);
    let overrides = StyleAttributes::default();
    let spacing = config.export.word_spacing;

    let cues = active_cues(&project.cues, time);
    if cues.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No caption at {time:.3}s");
        }
        return Ok(());
    }

    let mut frames = vec![];
    for cue in cues {
        let style = resolver.resolve(cue, &overrides);
        let preview = compose_caption(cue, &style, time, RenderPath::Preview, spacing);
        let export = compose_caption(cue, &style, time, RenderPath::Export, spacing);

        if json {
            frames.push(serde_json::json!({
                "cue": cue.id,
                "text": preview.text(),
                "preset": style.preset,
                "activations": preview.units.iter().map(|u| u.activation).collect::<Vec<_>>(),
                "preview_spacing": preview.word_spacing,
                "export_spacing": export.word_spacing,
            }));
            continue;
        }

        println!(
            "Cue {} [{:.3}, {:.3}) preset: {}",
            cue.id,
            cue.time_range.lower,
            cue.time_range.upper,
            style.preset.as_deref().unwrap_or("-")
        );
        for unit in &preview.units {
            let marker = if unit.is_active() {
                "*"
            } else if unit.activation > 0.0 {
                "~"
            } else {
                " "
            };
            println!(
                "  {marker} {:<16} {:>5.1}%  {}",
                unit.text,
                unit.activation * 100.0,
                unit.effective_color()
            );
        }
        println!(
            "  spacing: preview {:.1}, export {:.1}",
            preview.word_spacing, export.word_spacing
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    }
    Ok(())
}
