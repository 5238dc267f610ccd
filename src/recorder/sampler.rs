//! Fixed-rate capture loop
//!
//! One tick: grab the region, downsample, snapshot held keys, encode the action,
//! write the frame, append the step, then sleep out the period. The stop flag is
//! only checked at the top of the loop, so a started tick always completes.

use crate::capture::input::{HeldKeys, StopSignal};
use crate::capture::screen::FrameSource;
use crate::config::RunConfig;
use crate::processing::action::{active_channels, encode_action};
use crate::processing::downsample::resize_area;
use crate::recorder::rollout::{unix_time_now, RolloutRecorder, StepRecord};
use crate::recorder::schedule::FixedPeriodScheduler;
use std::sync::Arc;

/// Counters for one finished sampling loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerReport {
    pub ticks: u64,
    pub recorded: u64,
    pub skipped_captures: u64,
    pub skipped_writes: u64,
    pub overruns: u64,
    pub stopped_by_key: bool,
}

pub struct CaptureSampler<S: FrameSource> {
    source: S,
    config: Arc<RunConfig>,
    held: HeldKeys,
    stop: StopSignal,
}

impl<S: FrameSource> CaptureSampler<S> {
    pub fn new(source: S, config: Arc<RunConfig>, held: HeldKeys, stop: StopSignal) -> Self {
        Self {
            source,
            config,
            held,
            stop,
        }
    }

    /// Run until the stop flag is raised or `max_steps` ticks have elapsed.
    pub fn run(&mut self, recorder: &mut RolloutRecorder) -> SamplerReport {
        let mut scheduler = FixedPeriodScheduler::new(self.config.period());
        let mut report = SamplerReport::default();
        let out = self.config.out_size;
        let log_every = (self.config.hz.round() as u64).max(1) * 10;

        tracing::info!(
            "Sampling at {} Hz (period {:?}) for at most {} ticks",
            self.config.hz,
            scheduler.period(),
            self.config.max_steps
        );

        for _ in 0..self.config.max_steps {
            if self.stop.is_triggered() {
                report.stopped_by_key = true;
                break;
            }

            scheduler.begin_tick();
            report.ticks += 1;

            let captured = self
                .source
                .grab()
                .and_then(|frame| frame.to_rgb())
                .and_then(|rgb| resize_area(rgb, out.width(), out.height()));
            let obs = match captured {
                Ok(obs) => obs,
                Err(e) => {
                    tracing::warn!("Skipping tick {}: {}", report.ticks - 1, e);
                    report.skipped_captures += 1;
                    scheduler.finish_tick();
                    continue;
                }
            };

            let held_now = self.held.snapshot();
            let time_unix = unix_time_now();
            let action = encode_action(&held_now, &self.config.keymap);

            let t = recorder.next_index();
            let frame = match recorder.write_frame(t, &obs) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Failed to write frame {}: {}", t, e);
                    report.skipped_writes += 1;
                    scheduler.finish_tick();
                    continue;
                }
            };

            if t % log_every == 0 {
                tracing::debug!(
                    "Step {}: {:?}",
                    t,
                    active_channels(&action, &self.config.keymap)
                );
            }

            recorder.append(StepRecord {
                t,
                time_unix,
                held_keys: held_now.into_iter().collect(),
                action,
                frame,
            });
            report.recorded += 1;

            scheduler.finish_tick();
        }

        if !report.stopped_by_key && self.stop.is_triggered() {
            report.stopped_by_key = true;
        }
        report.overruns = scheduler.overruns();

        tracing::info!(
            "Sampling finished: {} ticks, {} steps, {} capture failures, {} write failures, {} overruns",
            report.ticks,
            report.recorded,
            report.skipped_captures,
            report.skipped_writes,
            report.overruns
        );
        report
    }

    #[cfg(test)]
    pub(crate) fn into_source(self) -> S {
        self.source
    }
}
