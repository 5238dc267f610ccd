//! Recording pipeline
//!
//! Channel trait, fixed-rate sampler, rollout storage and the session that ties
//! them together.

pub mod channel;
pub mod rollout;
pub mod sampler;
pub mod schedule;
pub mod session;

pub use channel::{ChannelType, RecordingChannel, RecordingError, RecordingResult};
pub use rollout::{latest_run, RolloutMetadata, RolloutRecorder, StepRecord};
pub use sampler::{CaptureSampler, SamplerReport};
pub use session::{SessionSummary, TeleopSession};
