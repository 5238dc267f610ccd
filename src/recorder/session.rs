//! Recording session
//!
//! Wires the keyboard and display channels to one held-key state and one stop
//! flag, runs them until the sampler ends, then seals the manifest.

use crate::capture::input::{HeldKeys, KeySource, KeyboardChannel, StopSignal};
use crate::capture::screen::channel::DisplayCaptureChannel;
use crate::capture::screen::FrameSource;
use crate::config::RunConfig;
use crate::recorder::channel::{RecordingChannel, RecordingResult};
use crate::recorder::rollout::allocate_run_dir;
use crate::recorder::sampler::SamplerReport;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a finished run landed and how the loop went
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub report: SamplerReport,
}

pub struct TeleopSession<S: FrameSource + 'static> {
    config: Arc<RunConfig>,
    display: DisplayCaptureChannel<S>,
    keyboard: KeyboardChannel,
    stop: StopSignal,
}

impl<S: FrameSource + 'static> TeleopSession<S> {
    /// Validate the configuration and wire up both channels.
    pub fn new(config: RunConfig, source: S, key_source: Box<dyn KeySource>) -> RecordingResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let held = HeldKeys::new();
        let stop = StopSignal::new();

        let keyboard = KeyboardChannel::new(key_source, held.clone(), stop.clone(), &config.stop_key);
        let display = DisplayCaptureChannel::new(source, config.clone(), held, stop.clone());

        Ok(Self {
            config,
            display,
            keyboard,
            stop,
        })
    }

    /// Flag that ends the run at the next tick boundary
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub async fn record(mut self) -> RecordingResult<SessionSummary> {
        let run_dir = allocate_run_dir(&self.config.output_root);

        // Display first: an unusable region must fail before the run directory exists
        self.display.initialize(&run_dir).await?;
        self.keyboard.initialize(&run_dir).await?;

        let delay = self.config.start_delay();
        if !delay.is_zero() {
            tracing::info!(
                "Starting in {:.1}s, focus the game window now",
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }

        self.keyboard.start().await?;
        if let Err(e) = self.display.start().await {
            self.keyboard.stop().await?;
            return Err(e);
        }

        tracing::info!(
            "Recording {} channels. Press '{}' to stop.",
            self.config.keymap.len(),
            self.config.stop_key
        );

        if let Err(e) = self.display.wait().await {
            tracing::error!("Sampling loop failed: {}", e);
            self.stop.trigger();
            let _ = self.keyboard.stop().await;
            return Err(e);
        }

        let channels: [&mut dyn RecordingChannel; 2] = [&mut self.keyboard, &mut self.display];
        for channel in channels {
            channel.stop().await?;
            tracing::debug!(
                "Channel '{}' ({}) stopped with {} output files",
                channel.id(),
                channel.channel_type(),
                channel.output_files().len()
            );
        }

        let (recorder, report) = self.display.take_outcome()?;
        let manifest_path = recorder.finalize()?;

        Ok(SessionSummary {
            run_dir,
            manifest_path,
            report,
        })
    }
}
