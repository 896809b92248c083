pub mod export;
pub mod highlight;
pub mod info;
pub mod presets;
pub mod segment;
pub mod subtitles;

use std::path::{Path, PathBuf};

use capcue_caption_core::style::{builtin_presets, PresetCatalog, RemotePresetFeed};
use capcue_caption_model::project::CaptionProject;
use capcue_common::config::AppConfig;

/// Build the session's preset catalog, merging the remote feed if one is
/// configured. A broken feed is reported and the built-ins are used.
pub fn load_catalog(config: &AppConfig, feed_override: Option<PathBuf>) -> PresetCatalog {
    let Some(feed_path) = feed_override.or_else(|| config.presets.remote_feed.clone()) else {
        return PresetCatalog::builtin();
    };

    match RemotePresetFeed::load(&feed_path) {
        Ok(feed) => PresetCatalog::merged(builtin_presets(), &feed),
        Err(e) => {
            tracing::warn!(
                path = %feed_path.display(),
                error = %e,
                "Ignoring preset feed, using built-in presets"
            );
            PresetCatalog::builtin()
        }
    }
}

pub fn load_project(path: &Path) -> anyhow::Result<CaptionProject> {
    CaptionProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}
