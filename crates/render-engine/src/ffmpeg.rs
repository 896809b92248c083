//! ffmpeg-backed compositor.
//!
//! Writes the job's captions to an ASS overlay, burns it into the source
//! video with the `subtitles` filter and parses `-progress pipe:1` output
//! into raw progress events.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use capcue_common::clock::FrameClock;
use capcue_common::error::{CapcueError, CapcueResult};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::ass::AssOverlay;
use crate::export::{
    CancelSignal, Compositor, ExportArtifact, ExportJob, ExportSettings, ProgressSender,
};

/// Seconds without ffmpeg advancing before a stall warning is logged.
const STALL_WARNING_SECS: u64 = 10;

/// Compositor that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    binary: String,
}

impl Default for FfmpegCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCompositor {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Use a specific ffmpeg binary instead of the one on `PATH`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_ffmpeg(
        &self,
        args: &[String],
        job: &ExportJob,
        progress: &ProgressSender,
        cancel: &mut CancelSignal,
    ) -> CapcueResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CapcueError::compositing(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(pid = child.id(), args_len = args.len(), "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CapcueError::compositing("Failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CapcueError::compositing("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once its stderr pipe is full.
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        let start = std::time::Instant::now();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.map_err(|e| {
                    CapcueError::compositing(format!("Failed reading ffmpeg progress: {e}"))
                })?,
                _ = cancel.cancelled() => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "Failed to kill ffmpeg");
                    }
                    return Err(CapcueError::Cancelled);
                }
            };
            let Some(line) = line else {
                break;
            };

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key != "progress" {
                continue;
            }

            if state.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = state.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            } else if last_progress_wall.elapsed().as_secs() >= STALL_WARNING_SECS {
                tracing::warn!(
                    out_time_secs = state.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
            progress
                .report("processing", state.fraction(job.duration_secs))
                .await;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CapcueError::compositing(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(CapcueError::compositing(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    async fn composite(
        &self,
        job: &ExportJob,
        progress: ProgressSender,
        mut cancel: CancelSignal,
    ) -> CapcueResult<ExportArtifact> {
        progress.report("preparing", 0.0).await;

        if !job.video_path.exists() {
            return Err(CapcueError::FileNotFound {
                path: job.video_path.clone(),
            });
        }
        if let Some(parent) = job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let overlay = AssOverlay::new(job.width, job.height, job.settings.word_spacing);
        let overlay_path = overlay_path_for(&job.output_path);
        tokio::fs::write(&overlay_path, overlay.render(&job.captions)).await?;
        tracing::debug!(path = %overlay_path.display(), "Wrote caption overlay");

        let args = build_args(job, &overlay_path);
        let result = self.run_ffmpeg(&args, job, &progress, &mut cancel).await;
        remove_quietly(&overlay_path).await;

        if let Err(err) = result {
            remove_quietly(&job.output_path).await;
            return Err(err);
        }

        progress.report("saving", 0.0).await;
        let size = match tokio::fs::metadata(&job.output_path).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if size == 0 {
            remove_quietly(&job.output_path).await;
            return Err(CapcueError::compositing("ffmpeg produced no output"));
        }
        progress.report("saving", 1.0).await;
        progress.report("completed", 1.0).await;

        let clock = FrameClock::new(job.settings.fps);
        Ok(ExportArtifact {
            path: job.output_path.clone(),
            frames: clock.total_frames(job.duration_secs),
            duration_secs: job.duration_secs,
        })
    }
}

/// Temporary overlay file next to the output.
fn overlay_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    output.with_file_name(format!(".{stem}.capcue.ass"))
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

fn build_args(job: &ExportJob, overlay_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-i".to_string(),
        job.video_path.display().to_string(),
        "-vf".to_string(),
        format!("subtitles=filename='{}'", escape_filter_path(overlay_path)),
        "-r".to_string(),
        job.settings.fps.max(1).to_string(),
    ];
    args.extend(codec_args(&job.settings));
    args.push(job.output_path.display().to_string());
    args
}

fn codec_args(settings: &ExportSettings) -> Vec<String> {
    let video_bitrate = format!("{}k", settings.video_bitrate_kbps.max(1000));
    let mut args = vec!["-c:v".to_string(), settings.video_codec.clone()];

    match settings.video_codec.as_str() {
        "libx264" => args.extend(
            ["-preset", "medium", "-profile:v", "high", "-pix_fmt", "yuv420p"]
                .map(String::from),
        ),
        "libx265" => args.extend(["-preset", "medium", "-pix_fmt", "yuv420p"].map(String::from)),
        _ => {}
    }

    args.extend([
        "-b:v".to_string(),
        video_bitrate,
        "-c:a".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args
}

/// Escape a path for use inside a quoted filtergraph argument.
fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

fn command_exists(binary: &str) -> bool {
    std::process::Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, expected_duration_secs: f64) -> f64 {
        if self.complete {
            return 1.0;
        }
        if !(expected_duration_secs > 0.0) {
            return 0.0;
        }
        (self.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ExportJob {
        ExportJob {
            video_path: PathBuf::from("/videos/in.mp4"),
            output_path: PathBuf::from("/videos/out/final.mp4"),
            duration_secs: 10.0,
            width: 1920,
            height: 1080,
            captions: vec![],
            settings: ExportSettings::default(),
        }
    }

    #[test]
    fn test_progress_state_parsing() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "2500000");
        assert!((state.fraction(10.0) - 0.25).abs() < 1e-12);
        state.update("out_time_ms", "20000000");
        assert_eq!(state.fraction(10.0), 1.0);
        state.update("out_time_us", "N/A");
        assert_eq!(state.fraction(10.0), 1.0);
        assert_eq!(state.fraction(0.0), 0.0);

        state.update("out_time_us", "1000000");
        state.update("progress", "end");
        assert_eq!(state.fraction(10.0), 1.0);
    }

    #[test]
    fn test_build_args() {
        let job = job();
        let args = build_args(&job, Path::new("/tmp/.final.capcue.ass"));
        assert_eq!(&args[5..7], &["-progress".to_string(), "pipe:1".to_string()]);
        assert!(args.contains(&"subtitles=filename='/tmp/.final.capcue.ass'".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"8000k".to_string()));
        assert_eq!(args.last().unwrap(), "/videos/out/final.mp4");
    }

    #[test]
    fn test_codec_args_for_other_encoders() {
        let settings = ExportSettings {
            video_codec: "libvpx-vp9".to_string(),
            video_bitrate_kbps: 10,
            ..ExportSettings::default()
        };
        let args = codec_args(&settings);
        assert_eq!(args[..2], ["-c:v".to_string(), "libvpx-vp9".to_string()]);
        assert!(!args.contains(&"-preset".to_string()));
        assert!(args.contains(&"1000k".to_string()));
    }

    #[test]
    fn test_overlay_path_and_escaping() {
        assert_eq!(
            overlay_path_for(Path::new("/videos/out/final.mp4")),
            PathBuf::from("/videos/out/.final.capcue.ass")
        );
        assert_eq!(
            escape_filter_path(Path::new("C:\\clips\\it's.ass")),
            "C\\:/clips/it\\'s.ass"
        );
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let compositor = FfmpegCompositor::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let mut job = job();
        job.video_path = std::env::temp_dir().join("capcue_test_missing_input.mp4");

        let err = compositor
            .composite(&job, ProgressSender::new(tx), CancelSignal::new(cancel_rx))
            .await
            .unwrap_err();
        assert!(matches!(err, CapcueError::FileNotFound { .. }));
    }
}
