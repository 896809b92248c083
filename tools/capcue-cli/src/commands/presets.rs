//! List the style presets available to this session.

use std::path::PathBuf;

use capcue_common::config::AppConfig;

pub fn run(config: &AppConfig, feed: Option<PathBuf>) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config, feed);

    println!("Presets ({}):", catalog.len());
    for preset in catalog.iter() {
        let attrs = &preset.attributes;
        let font = attrs.font_name.as_deref().unwrap_or("default");
        let size = attrs
            .font_size
            .map(|s| format!("{s}"))
            .unwrap_or_else(|| "-".to_string());
        print!("  {:<16} {font} {size}", preset.name);
        if preset.is_karaoke_preset {
            let highlight = preset
                .karaoke_highlight_color
                .map(|c| c.to_hex())
                .unwrap_or_else(|| "-".to_string());
            print!("  karaoke highlight {highlight}");
            if let Some(bg) = preset.karaoke_word_bg_color {
                print!(" word bg {}", bg.to_hex());
            }
        }
        println!();
    }
    Ok(())
}
