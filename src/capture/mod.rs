//! Capture sources
//!
//! Screen region frames and held-key input. Platform backends live behind the
//! `native` feature.

pub mod input;
pub mod screen;

// Re-export input channel
pub use input::{HeldKeys, KeyboardChannel, StopSignal};

// Re-export frame source
pub use screen::{CapturedFrame, FrameSource, PixelFormat};
