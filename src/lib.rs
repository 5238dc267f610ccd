//! Teleop Recorder - human demonstrations for imitation learning.
//!
//! Captures a fixed screen region at a steady rate while sampling which control
//! keys the operator holds, and stores time-aligned frame/action pairs plus a
//! `rollout.json` manifest under `data/teleop/<run_id>/`.

pub mod capture;
pub mod config;
pub mod processing;
pub mod recorder;

pub use config::{KeymapEntry, RunConfig};
pub use recorder::{RecordingError, RecordingResult, SessionSummary, TeleopSession};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teleop_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Record one run with the platform capture backends
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Teleop Recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::load().context("Failed to load run configuration")?;
    let summary = record_native(config).await?;

    tracing::info!(
        "Saved teleop rollout to {} ({} steps)",
        summary.run_dir.display(),
        summary.report.recorded
    );
    Ok(())
}

#[cfg(feature = "native")]
async fn record_native(config: RunConfig) -> anyhow::Result<SessionSummary> {
    use capture::input::RdevKeySource;
    use capture::screen::ScreenRegionSource;

    let source = ScreenRegionSource::new(config.region);
    let session = TeleopSession::new(config, source, Box::new(RdevKeySource))
        .context("Invalid run configuration")?;
    session.record().await.context("Recording failed")
}

#[cfg(not(feature = "native"))]
async fn record_native(_config: RunConfig) -> anyhow::Result<SessionSummary> {
    Err(RecordingError::PlatformError(
        "built without the `native` feature; rebuild with `--features native` to capture".to_string(),
    )
    .into())
}
