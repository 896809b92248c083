//! Show project information.

use std::path::PathBuf;

use capcue_caption_model::cue::VariantKind;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let p = super::load_project(&path)?;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Version: {}", p.version);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Video:");
    println!("  Path: {}", p.video_path(&path).display());
    println!(
        "  Resolution: {}x{} @ {}fps ({:.1}s)",
        p.video.width, p.video.height, p.video.fps, p.video.duration_secs
    );
    println!();

    let count = |kind: VariantKind| {
        p.cues
            .iter()
            .filter(|c| c.variant().map(|v| v.kind()) == Some(kind))
            .count()
    };
    let words: usize = p.cues.iter().map(|c| c.words().len()).sum();
    println!("Cues: {} ({words} words)", p.cues.len());
    println!(
        "  Plain: {}",
        p.cues.iter().filter(|c| !c.is_karaoke()).count()
    );
    println!("  Word highlight: {}", count(VariantKind::WordHighlight));
    println!("  Word background: {}", count(VariantKind::WordBackground));
    println!("  Word and scale: {}", count(VariantKind::WordAndScale));
    println!("  Letter wipe: {}", count(VariantKind::LetterWipe));

    let issues = p.validate();
    if !issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in issues {
            println!("  {issue}");
        }
    }

    Ok(())
}
