//! Screen region capture
//!
//! A `FrameSource` yields raw frames of the configured region. The native source
//! is only compiled with the `native` feature; tests drive the sampler with
//! scripted sources instead.

pub mod channel;
pub mod frame;

#[cfg(feature = "native")]
pub mod native;

pub use channel::DisplayCaptureChannel;
pub use frame::{CapturedFrame, PixelFormat};

#[cfg(feature = "native")]
pub use native::ScreenRegionSource;

use crate::recorder::channel::RecordingResult;

/// Producer of raw frames for a fixed capture region
pub trait FrameSource: Send {
    /// Validate the region against the capture device before the first tick.
    ///
    /// Errors here are configuration errors and abort the run before any
    /// output is created.
    fn prepare(&mut self) -> RecordingResult<()>;

    /// Grab one frame. Errors are treated as transient by the sampler.
    fn grab(&mut self) -> RecordingResult<CapturedFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn prepare(&mut self) -> RecordingResult<()> {
        (**self).prepare()
    }

    fn grab(&mut self) -> RecordingResult<CapturedFrame> {
        (**self).grab()
    }
}
