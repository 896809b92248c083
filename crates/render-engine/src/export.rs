//! Export pipeline: job description, compositor trait, and the controller
//! that turns raw compositor progress into monotonic, staged progress.
//!
//! The compositor runs on a spawned tokio task. Raw `(stage, progress)`
//! events travel back over a bounded channel and are applied by whoever owns
//! the [`ExportPipelineController`], so the controller itself needs no
//! locking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use capcue_caption_core::style::{PresetCatalog, StyleResolver};
use capcue_caption_model::project::CaptionProject;
use capcue_caption_model::style::StyleAttributes;
use capcue_common::config::ExportDefaults;
use capcue_common::error::{CapcueError, CapcueResult};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::compositor::StyledCue;

/// Capacity of the compositor → controller progress channel.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Named stages of an export, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Compositing,
    Saving,
    Completed,
}

impl ExportStage {
    /// Map a raw compositor stage label onto a named stage.
    ///
    /// Unknown labels count as preparation.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "done" => Self::Completed,
            "processing" | "compositing" | "rendering" => Self::Compositing,
            "saving" | "finalizing" => Self::Saving,
            _ => Self::Preparing,
        }
    }

    /// Aggregate fraction for `raw` progress within this stage.
    pub fn aggregate(self, raw: f64) -> f64 {
        let raw = if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self {
            Self::Preparing => 0.0,
            Self::Compositing => 0.05 + raw * 0.90,
            Self::Saving => 0.95 + raw * 0.05,
            Self::Completed => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Preparing => "Preparing",
            Self::Compositing => "Compositing",
            Self::Saving => "Saving",
            Self::Completed => "Completed",
        }
    }
}

/// Progress as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportProgress {
    pub stage: ExportStage,
    /// Overall completion in `[0, 1]`. Never decreases within one export.
    pub fraction: f64,
}

impl ExportProgress {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// A raw progress event as emitted by a compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProgress {
    pub stage: String,
    pub progress: f64,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportArtifact {
    /// Path of the rendered video.
    pub path: PathBuf,

    /// Number of output frames.
    pub frames: u64,

    /// Duration of the rendered video in seconds.
    pub duration_secs: f64,
}

/// Why an export ended in the failed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub message: String,
    pub cancelled: bool,
    pub retryable: bool,
}

impl From<&CapcueError> for ExportFailure {
    fn from(err: &CapcueError) -> Self {
        Self {
            message: err.to_string(),
            cancelled: matches!(err, CapcueError::Cancelled),
            retryable: err.is_retryable(),
        }
    }
}

/// Lifecycle of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Idle,
    Running(ExportStage),
    Completed(ExportArtifact),
    Failed(ExportFailure),
}

/// Encoder settings for an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Output frame rate. 0 keeps the source frame rate.
    pub fps: u32,
    pub video_codec: String,
    pub video_bitrate_kbps: u32,
    /// Nominal word spacing; calibrated per variant when compositing.
    pub word_spacing: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from(&ExportDefaults::default())
    }
}

impl From<&ExportDefaults> for ExportSettings {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            fps: defaults.fps,
            video_codec: defaults.video_codec.clone(),
            video_bitrate_kbps: defaults.video_bitrate_kbps,
            word_spacing: defaults.word_spacing,
        }
    }
}

/// An export job ready to be composited.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Source video.
    pub video_path: PathBuf,

    /// Output file path.
    pub output_path: PathBuf,

    /// Source duration in seconds.
    pub duration_secs: f64,

    /// Output frame size.
    pub width: u32,
    pub height: u32,

    /// Cues with their resolved styles.
    pub captions: Vec<StyledCue>,

    pub settings: ExportSettings,
}

impl ExportJob {
    /// Build a job from a loaded project, resolving every cue's style
    /// against `catalog`.
    pub fn from_project(
        project: &CaptionProject,
        project_file: &Path,
        catalog: &PresetCatalog,
        output_path: impl Into<PathBuf>,
        settings: ExportSettings,
    ) -> Self {
        let resolver = StyleResolver::new(catalog);
        let overrides = StyleAttributes::default();
        let captions = project
            .cues
            .iter()
            .map(|cue| StyledCue {
                style: resolver.resolve(cue, &overrides),
                cue: cue.clone(),
            })
            .collect();

        let settings = ExportSettings {
            fps: if settings.fps == 0 {
                project.video.fps
            } else {
                settings.fps
            },
            ..settings
        };

        Self {
            video_path: project.video_path(project_file),
            output_path: output_path.into(),
            duration_secs: project.video.duration_secs,
            width: project.video.width,
            height: project.video.height,
            captions,
            settings,
        }
    }
}

/// Sending half of the progress channel, handed to compositors.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<RawProgress>,
}

impl ProgressSender {
    pub fn new(tx: mpsc::Sender<RawProgress>) -> Self {
        Self { tx }
    }

    /// Report raw progress. Waits while the channel is full; events sent
    /// after the controller went away are dropped.
    pub async fn report(&self, stage: &str, progress: f64) {
        let event = RawProgress {
            stage: stage.to_string(),
            progress,
        };
        if self.tx.send(event).await.is_err() {
            tracing::debug!(stage, "Progress receiver dropped");
        }
    }
}

/// Receiving half of the cancellation signal, handed to compositors.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if every
    /// [`ExportHandle`] was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Cloneable handle used to cancel a running export.
///
/// Dropping it does not cancel anything.
#[derive(Debug, Clone)]
pub struct ExportHandle {
    cancel: Arc<watch::Sender<bool>>,
}

impl ExportHandle {
    pub fn cancel(&self) {
        tracing::info!("Export cancellation requested");
        self.cancel.send_replace(true);
    }
}

/// Backend that burns captions into a video.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Run the job to completion, reporting raw progress along the way.
    ///
    /// On failure or cancellation no partial output may be left behind.
    async fn composite(
        &self,
        job: &ExportJob,
        progress: ProgressSender,
        cancel: CancelSignal,
    ) -> CapcueResult<ExportArtifact>;
}

/// A compositor running on a background task.
pub struct ExportTask {
    events: mpsc::Receiver<RawProgress>,
    join: JoinHandle<CapcueResult<ExportArtifact>>,
    handle: ExportHandle,
}

impl ExportTask {
    pub fn handle(&self) -> ExportHandle {
        self.handle.clone()
    }
}

/// Drives a compositor and tracks the state of the current export.
#[derive(Debug)]
pub struct ExportPipelineController {
    state: ExportState,
    stage: ExportStage,
    fraction: f64,
}

impl Default for ExportPipelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPipelineController {
    pub fn new() -> Self {
        Self {
            state: ExportState::Idle,
            stage: ExportStage::Preparing,
            fraction: 0.0,
        }
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ExportState::Running(_))
    }

    pub fn progress(&self) -> ExportProgress {
        ExportProgress {
            stage: self.stage,
            fraction: self.fraction,
        }
    }

    /// Enter the preparing stage with progress reset to 0.
    ///
    /// Rejected while an export is running; allowed again after it
    /// completed or failed.
    pub fn start(&mut self) -> CapcueResult<()> {
        if self.is_running() {
            tracing::warn!(stage = ?self.stage, "Rejected concurrent export");
            return Err(CapcueError::ConcurrentExportRejected);
        }
        self.state = ExportState::Running(ExportStage::Preparing);
        self.stage = ExportStage::Preparing;
        self.fraction = 0.0;
        tracing::info!("Export started");
        Ok(())
    }

    /// Apply one raw compositor event.
    ///
    /// Returns the updated progress, or `None` when no export is running.
    pub fn apply_raw_progress(
        &mut self,
        raw_stage: &str,
        raw_progress: f64,
    ) -> Option<ExportProgress> {
        let ExportState::Running(current) = self.state else {
            tracing::debug!(raw_stage, "Ignoring progress outside a running export");
            return None;
        };

        let mapped = ExportStage::from_raw(raw_stage);
        if mapped < current {
            tracing::debug!(
                raw_stage,
                current = ?current,
                "Ignoring progress for an earlier stage"
            );
            return Some(self.progress());
        }

        if mapped != current {
            tracing::debug!(from = ?current, to = ?mapped, "Export stage changed");
        }
        self.state = ExportState::Running(mapped);
        self.stage = mapped;
        self.fraction = self.fraction.max(mapped.aggregate(raw_progress));
        Some(self.progress())
    }

    /// Mark the running export as completed.
    pub fn finish(&mut self, artifact: ExportArtifact) {
        if !self.is_running() {
            tracing::warn!("finish() called without a running export");
            return;
        }
        tracing::info!(
            path = %artifact.path.display(),
            frames = artifact.frames,
            "Export completed"
        );
        self.stage = ExportStage::Completed;
        self.fraction = 1.0;
        self.state = ExportState::Completed(artifact);
    }

    /// Mark the running export as failed, keeping the error description.
    pub fn fail(&mut self, err: &CapcueError) {
        if !self.is_running() {
            tracing::warn!(error = %err, "fail() called without a running export");
            return;
        }
        if matches!(err, CapcueError::Cancelled) {
            tracing::info!(stage = ?self.stage, "Export cancelled");
        } else {
            tracing::error!(stage = ?self.stage, error = %err, "Export failed");
        }
        self.state = ExportState::Failed(ExportFailure::from(err));
    }

    /// Start `job` on a background task.
    pub fn spawn(
        &mut self,
        compositor: Arc<dyn Compositor>,
        job: ExportJob,
    ) -> CapcueResult<ExportTask> {
        if self.is_running() {
            tracing::warn!(stage = ?self.stage, "Rejected concurrent export");
            return Err(CapcueError::ConcurrentExportRejected);
        }
        if !compositor.is_available() {
            return Err(CapcueError::unsupported(format!(
                "Compositor '{}' is not available on this system",
                compositor.name()
            )));
        }
        self.start()?;

        tracing::info!(
            compositor = compositor.name(),
            output = %job.output_path.display(),
            captions = job.captions.len(),
            "Spawning compositor"
        );

        let (tx, events) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let progress = ProgressSender::new(tx);
        let cancel = CancelSignal::new(cancel_rx);

        let join = tokio::spawn(async move { compositor.composite(&job, progress, cancel).await });

        Ok(ExportTask {
            events,
            join,
            handle: ExportHandle {
                cancel: Arc::new(cancel_tx),
            },
        })
    }

    /// Apply progress from `task` until it finishes, calling `observer` on
    /// every update.
    pub async fn drive<F>(
        &mut self,
        mut task: ExportTask,
        mut observer: F,
    ) -> CapcueResult<ExportArtifact>
    where
        F: FnMut(ExportProgress),
    {
        while let Some(event) = task.events.recv().await {
            if let Some(progress) = self.apply_raw_progress(&event.stage, event.progress) {
                observer(progress);
            }
        }

        let result = match task.join.await {
            Ok(result) => result,
            Err(e) => Err(CapcueError::compositing(format!(
                "Compositor task failed: {e}"
            ))),
        };

        match result {
            Ok(artifact) => {
                self.finish(artifact.clone());
                observer(self.progress());
                Ok(artifact)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// [`spawn`](Self::spawn) followed by [`drive`](Self::drive).
    pub async fn run<F>(
        &mut self,
        compositor: Arc<dyn Compositor>,
        job: ExportJob,
        observer: F,
    ) -> CapcueResult<ExportArtifact>
    where
        F: FnMut(ExportProgress),
    {
        let task = self.spawn(compositor, job)?;
        self.drive(task, observer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Replays a fixed list of raw events, then returns `outcome`.
    struct ScriptedCompositor {
        events: Vec<(&'static str, f64)>,
        fail_with: Option<&'static str>,
        wait_for_cancel: bool,
        available: bool,
    }

    impl ScriptedCompositor {
        fn new(events: Vec<(&'static str, f64)>) -> Self {
            Self {
                events,
                fail_with: None,
                wait_for_cancel: false,
                available: true,
            }
        }
    }

    #[async_trait]
    impl Compositor for ScriptedCompositor {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn composite(
            &self,
            job: &ExportJob,
            progress: ProgressSender,
            mut cancel: CancelSignal,
        ) -> CapcueResult<ExportArtifact> {
            for (stage, value) in &self.events {
                progress.report(stage, *value).await;
            }
            if self.wait_for_cancel {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(CapcueError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                }
            }
            if let Some(message) = self.fail_with {
                return Err(CapcueError::compositing(message));
            }
            Ok(ExportArtifact {
                path: job.output_path.clone(),
                frames: 30,
                duration_secs: 1.0,
            })
        }
    }

    fn job() -> ExportJob {
        ExportJob {
            video_path: PathBuf::from("in.mp4"),
            output_path: PathBuf::from("out.mp4"),
            duration_secs: 1.0,
            width: 1280,
            height: 720,
            captions: vec![],
            settings: ExportSettings::default(),
        }
    }

    #[test]
    fn test_raw_stage_mapping() {
        assert_eq!(ExportStage::from_raw("completed"), ExportStage::Completed);
        assert_eq!(ExportStage::from_raw("Done"), ExportStage::Completed);
        assert_eq!(ExportStage::from_raw("rendering"), ExportStage::Compositing);
        assert_eq!(ExportStage::from_raw("finalizing"), ExportStage::Saving);
        assert_eq!(ExportStage::from_raw("warming up"), ExportStage::Preparing);
    }

    #[test]
    fn test_aggregate_mapping() {
        assert_eq!(ExportStage::Preparing.aggregate(0.7), 0.0);
        assert!((ExportStage::Compositing.aggregate(0.5) - 0.5).abs() < 1e-12);
        assert!((ExportStage::Saving.aggregate(1.0) - 1.0).abs() < 1e-12);
        assert!((ExportStage::Compositing.aggregate(7.0) - 0.95).abs() < 1e-12);
        assert!((ExportStage::Compositing.aggregate(f64::NAN) - 0.05).abs() < 1e-12);
        assert_eq!(ExportStage::Completed.aggregate(0.0), 1.0);
    }

    #[test]
    fn test_stages_never_regress() {
        let mut controller = ExportPipelineController::new();
        controller.start().unwrap();

        controller.apply_raw_progress("processing", 0.5);
        let p = controller.apply_raw_progress("preparing", 0.9).unwrap();
        assert_eq!(p.stage, ExportStage::Compositing);
        assert!((p.fraction - 0.5).abs() < 1e-12);

        controller.apply_raw_progress("saving", 0.0);
        let p = controller.apply_raw_progress("processing", 1.0).unwrap();
        assert_eq!(p.stage, ExportStage::Saving);
        assert!((p.fraction - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_progress_ignored_when_idle() {
        let mut controller = ExportPipelineController::new();
        assert!(controller.apply_raw_progress("processing", 0.5).is_none());
        assert_eq!(controller.state(), &ExportState::Idle);
    }

    #[test]
    fn test_start_rejected_while_running_and_allowed_after() {
        let mut controller = ExportPipelineController::new();
        controller.start().unwrap();
        assert!(matches!(
            controller.start(),
            Err(CapcueError::ConcurrentExportRejected)
        ));

        controller.fail(&CapcueError::compositing("boom"));
        controller.start().unwrap();
        assert_eq!(controller.progress().fraction, 0.0);
        assert_eq!(
            controller.state(),
            &ExportState::Running(ExportStage::Preparing)
        );
    }

    #[tokio::test]
    async fn test_successful_export() {
        let compositor = Arc::new(ScriptedCompositor::new(vec![
            ("preparing", 0.0),
            ("processing", 0.25),
            ("processing", 0.5),
            ("processing", 0.4),
            ("saving", 0.0),
            ("completed", 1.0),
        ]));
        let mut controller = ExportPipelineController::new();
        let mut seen = vec![];

        let artifact = controller
            .run(compositor, job(), |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(artifact.path, PathBuf::from("out.mp4"));
        assert!(matches!(controller.state(), ExportState::Completed(_)));
        assert!(seen.windows(2).all(|w| w[1].fraction >= w[0].fraction));
        assert!(seen
            .iter()
            .any(|p| p.stage == ExportStage::Compositing && (p.fraction - 0.5).abs() < 1e-12));
        assert_eq!(seen.last().unwrap().fraction, 1.0);
    }

    #[tokio::test]
    async fn test_failed_export_keeps_error_and_allows_retry() {
        let compositor = Arc::new(ScriptedCompositor {
            fail_with: Some("encoder crashed"),
            ..ScriptedCompositor::new(vec![("processing", 0.3)])
        });
        let mut controller = ExportPipelineController::new();

        let err = controller
            .run(compositor.clone(), job(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, CapcueError::Compositing { .. }));
        match controller.state() {
            ExportState::Failed(failure) => {
                assert!(failure.message.contains("encoder crashed"));
                assert!(!failure.cancelled);
                assert!(failure.retryable);
            }
            other => panic!("unexpected state {other:?}"),
        }

        assert!(controller.run(compositor, job(), |_| {}).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_and_concurrent_rejection() {
        let compositor = Arc::new(ScriptedCompositor {
            wait_for_cancel: true,
            ..ScriptedCompositor::new(vec![("processing", 0.1)])
        });
        let mut controller = ExportPipelineController::new();

        let task = controller.spawn(compositor.clone(), job()).unwrap();
        assert!(matches!(
            controller.spawn(compositor, job()),
            Err(CapcueError::ConcurrentExportRejected)
        ));

        task.handle().cancel();
        let err = controller.drive(task, |_| {}).await.unwrap_err();
        assert!(matches!(err, CapcueError::Cancelled));
        match controller.state() {
            ExportState::Failed(failure) => assert!(failure.cancelled),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropping_a_handle_does_not_cancel() {
        let compositor = Arc::new(ScriptedCompositor::new(vec![("processing", 1.0)]));
        let mut controller = ExportPipelineController::new();

        let task = controller.spawn(compositor, job()).unwrap();
        drop(task.handle());
        assert!(controller.drive(task, |_| {}).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_signal_without_senders_never_fires() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut signal = CancelSignal::new(rx);
        assert!(!signal.is_cancelled());
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_compositor_is_rejected() {
        let compositor = Arc::new(ScriptedCompositor {
            available: false,
            ..ScriptedCompositor::new(vec![])
        });
        let mut controller = ExportPipelineController::new();
        assert!(matches!(
            controller.spawn(compositor, job()),
            Err(CapcueError::Unsupported { .. })
        ));
        assert_eq!(controller.state(), &ExportState::Idle);
    }

    fn raw_event() -> impl Strategy<Value = (&'static str, f64)> {
        (
            prop::sample::select(vec![
                "preparing",
                "processing",
                "saving",
                "completed",
                "unknown",
            ]),
            -0.5f64..1.5,
        )
    }

    proptest! {
        #[test]
        fn progress_is_monotonic(events in prop::collection::vec(raw_event(), 0..40)) {
            let mut controller = ExportPipelineController::new();
            controller.start().unwrap();
            let mut last = controller.progress();
            for (stage, value) in events {
                let next = controller.apply_raw_progress(stage, value).unwrap();
                prop_assert!(next.fraction >= last.fraction);
                prop_assert!(next.stage >= last.stage);
                prop_assert!((0.0..=1.0).contains(&next.fraction));
                last = next;
            }
        }
    }
}
