//! Write SRT/VTT sidecar subtitles for a project.

use std::path::PathBuf;

use capcue_caption_core::subtitles::save_subtitles;

pub fn run(path: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let project = super::load_project(&path)?;
    save_subtitles(&project.cues, &output)?;
    println!(
        "Wrote {} cues to: {}",
        project.cues.len(),
        output.display()
    );
    Ok(())
}
