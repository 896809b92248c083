//! Burn a project's captions into its video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use capcue_common::config::AppConfig;
use capcue_render_engine::export::{ExportJob, ExportPipelineController, ExportSettings};
use capcue_render_engine::ffmpeg::FfmpegCompositor;

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    fps: Option<u32>,
    codec: Option<String>,
    bitrate: Option<u32>,
    feed: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Exporting project: {}", path.display());

    let project = super::load_project(&path)?;
    let catalog = super::load_catalog(config, feed);

    let mut settings = ExportSettings::from(&config.export);
    settings.fps = fps.unwrap_or(project.video.fps);
    if let Some(codec) = codec {
        settings.video_codec = codec;
    }
    if let Some(bitrate) = bitrate {
        settings.video_bitrate_kbps = bitrate;
    }

    let output_path = output.unwrap_or_else(|| path.with_extension("captioned.mp4"));
    let job = ExportJob::from_project(&project, &path, &catalog, &output_path, settings);

    println!("  Source: {}", job.video_path.display());
    println!("  Output: {}", output_path.display());
    println!(
        "  Resolution: {}x{} @ {}fps, {} ({} kbps)",
        job.width,
        job.height,
        job.settings.fps,
        job.settings.video_codec,
        job.settings.video_bitrate_kbps
    );

    let mut controller = ExportPipelineController::new();
    let task = controller.spawn(Arc::new(FfmpegCompositor::new()), job)?;

    let handle = task.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let result = controller
        .drive(task, |p| {
            print!("\r  {:<12} {:>5.1}%  ", p.stage.label(), p.percent());
            let _ = std::io::stdout().flush();
        })
        .await;

    match result {
        Ok(artifact) => {
            println!(
                "\nExport complete: {} ({} frames)",
                artifact.path.display(),
                artifact.frames
            );
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
