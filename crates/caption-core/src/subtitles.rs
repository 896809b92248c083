//! SRT and WebVTT sidecar output for cue lists.

use std::path::Path;

use capcue_caption_model::cue::Cue;
use capcue_common::clock::{format_timecode, TimecodeStyle};
use capcue_common::error::CapcueResult;

/// Generate SRT content. Cues are numbered from 1 in time order.
pub fn generate_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for (i, cue) in sorted(cues).into_iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timecode(cue.time_range.lower, TimecodeStyle::Srt),
            format_timecode(cue.time_range.upper, TimecodeStyle::Srt),
        ));
        output.push_str(cue.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT content. Cue ids become VTT cue identifiers.
pub fn generate_vtt(cues: &[Cue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in sorted(cues) {
        output.push_str(&format!("{}\n", cue.id));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timecode(cue.time_range.lower, TimecodeStyle::Vtt),
            format_timecode(cue.time_range.upper, TimecodeStyle::Vtt),
        ));
        output.push_str(cue.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Write subtitles to `path`, choosing the format from its extension.
pub fn save_subtitles(cues: &[Cue], path: &Path) -> CapcueResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("vtt") => generate_vtt(cues),
        _ => generate_srt(cues),
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), cues = cues.len(), "Subtitles written");
    Ok(())
}

fn sorted(cues: &[Cue]) -> Vec<&Cue> {
    let mut refs: Vec<&Cue> = cues
        .iter()
        .filter(|c| c.time_range.is_valid() && !c.text.trim().is_empty())
        .collect();
    refs.sort_by(|a, b| a.time_range.lower.total_cmp(&b.time_range.lower));
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcue_caption_model::timing::TimeRange;

    fn cues() -> Vec<Cue> {
        vec![
            Cue::plain("cue-0002", "This is a test", TimeRange::new(3.0, 5.0)),
            Cue::plain("cue-0001", "Hello world", TimeRange::new(0.0, 2.5)),
            Cue::plain("cue-0003", "   ", TimeRange::new(6.0, 7.0)),
        ]
    }

    #[test]
    fn test_srt_generation() {
        let srt = generate_srt(&cues());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world\n\n"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test"));
        assert!(!srt.contains("\n3\n"));
    }

    #[test]
    fn test_vtt_generation() {
        let vtt = generate_vtt(&[Cue::plain(
            "cue-0001",
            "One minute in",
            TimeRange::new(61.5, 63.0),
        )]);
        assert!(vtt.starts_with("WEBVTT\n"));
        assert!(vtt.contains("cue-0001\n00:01:01.500 --> 00:01:03.000\nOne minute in"));
    }

    #[test]
    fn test_save_picks_format_by_extension() {
        let dir = std::env::temp_dir().join("capcue_test_subtitles");
        std::fs::create_dir_all(&dir).unwrap();

        let vtt_path = dir.join("captions.VTT");
        save_subtitles(&cues(), &vtt_path).unwrap();
        assert!(std::fs::read_to_string(&vtt_path)
            .unwrap()
            .starts_with("WEBVTT"));

        let srt_path = dir.join("captions.srt");
        save_subtitles(&cues(), &srt_path).unwrap();
        assert!(std::fs::read_to_string(&srt_path).unwrap().starts_with("1\n"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
