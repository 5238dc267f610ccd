//! Held-key tracking
//!
//! Implements a `RecordingChannel` that listens for key and mouse-button events
//! on its own thread and keeps the set of currently held canonical key names.

pub mod channel;
pub mod held;
pub mod types;

#[cfg(feature = "native")]
pub mod native;

pub use channel::{KeyEventHandler, KeySource, KeyboardChannel, ListenerControl};
#[cfg(test)]
pub use channel::ScriptedKeySource;
pub use held::{HeldKeys, StopSignal};
pub use types::{KeyEvent, RawKey};

#[cfg(feature = "native")]
pub use native::RdevKeySource;
