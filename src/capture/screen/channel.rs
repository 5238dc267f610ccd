use crate::capture::input::{HeldKeys, StopSignal};
use crate::capture::screen::FrameSource;
use crate::config::RunConfig;
use crate::recorder::channel::{ChannelType, RecordingChannel, RecordingError, RecordingResult};
use crate::recorder::rollout::RolloutRecorder;
use crate::recorder::sampler::{CaptureSampler, SamplerReport};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub type SamplerOutcome = (RolloutRecorder, SamplerReport);

/// Display capture channel
///
/// Owns the frame source and the rollout recorder. While recording, both are
/// moved onto a blocking worker that runs the sampling loop; they come back
/// when the loop ends.
pub struct DisplayCaptureChannel<S: FrameSource + 'static> {
    /// Channel identifier
    id: String,

    /// Frame source, present until `start`
    source: Option<S>,

    /// Shared run configuration
    config: Arc<RunConfig>,

    /// Held-key state read every tick
    held: HeldKeys,

    /// Stop flag checked at the top of every tick
    stop: StopSignal,

    /// Whether currently recording
    is_recording: Arc<AtomicBool>,

    /// Recorder created by `initialize`
    recorder: Option<RolloutRecorder>,

    /// Sampling loop while it runs
    task: Option<JoinHandle<SamplerOutcome>>,

    /// Recorder and report once the loop has ended
    outcome: Option<SamplerOutcome>,
}

impl<S: FrameSource + 'static> DisplayCaptureChannel<S> {
    pub fn new(source: S, config: Arc<RunConfig>, held: HeldKeys, stop: StopSignal) -> Self {
        Self {
            id: "display".to_string(),
            source: Some(source),
            config,
            held,
            stop,
            is_recording: Arc::new(AtomicBool::new(false)),
            recorder: None,
            task: None,
            outcome: None,
        }
    }

    /// Wait for the sampling loop to end on its own (stop key or step limit).
    pub async fn wait(&mut self) -> RecordingResult<()> {
        if let Some(task) = self.task.take() {
            let outcome = task.await.map_err(|e| {
                RecordingError::PlatformError(format!("Sampler task failed: {}", e))
            })?;
            self.outcome = Some(outcome);
        }
        self.is_recording.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Hand back the recorder and loop report after the channel stopped
    pub fn take_outcome(&mut self) -> RecordingResult<SamplerOutcome> {
        self.outcome.take().ok_or(RecordingError::NotRecording)
    }
}

#[async_trait]
impl<S: FrameSource + 'static> RecordingChannel for DisplayCaptureChannel<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Display
    }

    async fn initialize(&mut self, run_dir: &Path) -> RecordingResult<()> {
        let source = self.source.as_mut().ok_or_else(|| {
            RecordingError::ConfigurationError("Frame source already consumed".to_string())
        })?;

        // Region problems must surface before anything is written to disk
        source.prepare()?;

        self.recorder = Some(RolloutRecorder::create(run_dir, &self.config)?);

        tracing::info!(
            "Display channel initialized ({}x{} -> {}x{})",
            self.config.region.width,
            self.config.region.height,
            self.config.out_size.width(),
            self.config.out_size.height()
        );
        Ok(())
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyRecording);
        }

        let mut recorder = self.recorder.take().ok_or_else(|| {
            RecordingError::ConfigurationError("Display channel not initialized".to_string())
        })?;
        let source = self.source.take().ok_or_else(|| {
            RecordingError::ConfigurationError("Frame source already consumed".to_string())
        })?;

        let mut sampler =
            CaptureSampler::new(source, self.config.clone(), self.held.clone(), self.stop.clone());

        self.is_recording.store(true, Ordering::SeqCst);
        self.task = Some(tokio::task::spawn_blocking(move || {
            let report = sampler.run(&mut recorder);
            (recorder, report)
        }));

        tracing::info!("Display capture started");
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        if self.task.is_none() && self.outcome.is_none() {
            return Err(RecordingError::NotRecording);
        }

        // The in-flight tick finishes before the loop sees the flag
        self.stop.trigger();
        self.wait().await?;

        tracing::info!("Display capture stopped");
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn output_files(&self) -> Vec<String> {
        let Some((recorder, _)) = self.outcome.as_ref() else {
            return Vec::new();
        };
        recorder
            .frame_files()
            .iter()
            .map(|f| recorder.run_dir().join(f).to_string_lossy().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::screen::CapturedFrame;
    use crate::recorder::sampler::tests::{small_config, FakeSource};

    struct OffscreenSource;

    impl FrameSource for OffscreenSource {
        fn prepare(&mut self) -> RecordingResult<()> {
            Err(RecordingError::ConfigurationError("region off screen".to_string()))
        }

        fn grab(&mut self) -> RecordingResult<CapturedFrame> {
            unreachable!("grab after failed prepare")
        }
    }

    #[tokio::test]
    async fn test_invalid_region_creates_no_run() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let mut channel = DisplayCaptureChannel::new(
            OffscreenSource,
            Arc::new(small_config(10.0, 5)),
            HeldKeys::new(),
            StopSignal::new(),
        );

        let result = channel.initialize(&run_dir).await;
        assert!(matches!(result, Err(RecordingError::ConfigurationError(_))));
        assert!(!run_dir.exists());
        assert!(channel.start().await.is_err());
    }

    #[tokio::test]
    async fn test_runs_to_step_limit_and_returns_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = DisplayCaptureChannel::new(
            FakeSource::new(64, 36),
            Arc::new(small_config(100.0, 4)),
            HeldKeys::new(),
            StopSignal::new(),
        );

        channel.initialize(dir.path()).await.unwrap();
        channel.start().await.unwrap();
        assert!(channel.is_recording());
        assert!(channel.start().await.is_err());

        channel.wait().await.unwrap();
        assert!(!channel.is_recording());
        assert_eq!(channel.output_files().len(), 4);

        let (recorder, report) = channel.take_outcome().unwrap();
        assert_eq!(report.recorded, 4);
        assert_eq!(recorder.steps().len(), 4);
    }

    #[tokio::test]
    async fn test_stop_ends_loop_early() {
        let dir = tempfile::tempdir().unwrap();
        let stop = StopSignal::new();
        let mut channel = DisplayCaptureChannel::new(
            FakeSource::new(64, 36),
            Arc::new(small_config(50.0, 10_000)),
            HeldKeys::new(),
            stop.clone(),
        );

        channel.initialize(dir.path()).await.unwrap();
        channel.start().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        channel.stop().await.unwrap();

        assert!(stop.is_triggered());
        let (recorder, report) = channel.take_outcome().unwrap();
        assert!(report.stopped_by_key);
        assert!(report.ticks < 10_000);
        assert_eq!(recorder.steps().len() as u64, report.recorded);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_error() {
        let mut channel = DisplayCaptureChannel::new(
            FakeSource::new(64, 36),
            Arc::new(small_config(10.0, 5)),
            HeldKeys::new(),
            StopSignal::new(),
        );
        assert!(matches!(channel.stop().await, Err(RecordingError::NotRecording)));
    }
}
