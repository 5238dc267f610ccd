use crate::capture::input::held::{HeldKeys, StopSignal};
use crate::capture::input::types::KeyEvent;
use crate::recorder::channel::{ChannelType, RecordingChannel, RecordingError, RecordingResult};
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the key source should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    Continue,
    Stop,
}

/// Applies normalized key events to the shared held-key state.
///
/// Cloned into the platform hook; all clones share the same state.
#[derive(Debug, Clone)]
pub struct KeyEventHandler {
    held: HeldKeys,
    stop: StopSignal,
    stop_key: String,
    active: Arc<AtomicBool>,
}

impl KeyEventHandler {
    pub fn new(held: HeldKeys, stop: StopSignal, stop_key: &str) -> Self {
        Self {
            held,
            stop,
            stop_key: stop_key.to_string(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop reacting to events. Used when the hook itself cannot be torn down.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn handle(&self, event: KeyEvent) -> ListenerControl {
        if !self.is_active() {
            return ListenerControl::Stop;
        }

        match event {
            KeyEvent::Press(key) => {
                let Some(name) = key.canonical_name() else {
                    return ListenerControl::Continue;
                };
                if name == self.stop_key {
                    tracing::info!("Stop key '{}' pressed", name);
                    self.stop.trigger();
                    self.deactivate();
                    return ListenerControl::Stop;
                }
                self.held.press(&name);
            }
            KeyEvent::Release(key) => {
                if let Some(name) = key.canonical_name() {
                    self.held.release(&name);
                }
            }
        }

        ListenerControl::Continue
    }
}

/// Host input subsystem delivering key events to a handler
pub trait KeySource: Send + 'static {
    /// Block, feeding events to `handler` until it returns `Stop` or the source ends.
    fn listen(self: Box<Self>, handler: KeyEventHandler) -> RecordingResult<()>;
}

/// Key source that replays a fixed list of events, then ends
#[cfg(test)]
pub struct ScriptedKeySource {
    events: Vec<KeyEvent>,
}

#[cfg(test)]
impl ScriptedKeySource {
    pub fn new(events: Vec<KeyEvent>) -> Self {
        Self { events }
    }
}

#[cfg(test)]
impl KeySource for ScriptedKeySource {
    fn listen(self: Box<Self>, handler: KeyEventHandler) -> RecordingResult<()> {
        for event in self.events {
            if handler.handle(event) == ListenerControl::Stop {
                break;
            }
        }
        Ok(())
    }
}

/// Records which keys the operator holds, on a dedicated listener thread
pub struct KeyboardChannel {
    id: String,
    handler: KeyEventHandler,
    held: HeldKeys,
    source: Option<Box<dyn KeySource>>,
    is_recording: Arc<AtomicBool>,
    thread_handle: Arc<ParkingMutex<Option<std::thread::JoinHandle<()>>>>,
}

impl KeyboardChannel {
    pub fn new(source: Box<dyn KeySource>, held: HeldKeys, stop: StopSignal, stop_key: &str) -> Self {
        Self {
            id: "keyboard".to_string(),
            handler: KeyEventHandler::new(held.clone(), stop, stop_key),
            held,
            source: Some(source),
            is_recording: Arc::new(AtomicBool::new(false)),
            thread_handle: Arc::new(ParkingMutex::new(None)),
        }
    }
}

#[async_trait]
impl RecordingChannel for KeyboardChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Input
    }

    async fn initialize(&mut self, run_dir: &Path) -> RecordingResult<()> {
        tracing::info!("Keyboard channel initialized for {}", run_dir.display());
        Ok(())
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyRecording);
        }

        let source = self.source.take().ok_or_else(|| {
            RecordingError::ConfigurationError("Keyboard source already consumed".to_string())
        })?;

        self.held.clear();

        let handler = self.handler.clone();
        let is_recording = self.is_recording.clone();
        is_recording.store(true, Ordering::SeqCst);

        let handle = std::thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                if let Err(e) = source.listen(handler) {
                    tracing::warn!("Key listener ended with error: {}", e);
                }
                is_recording.store(false, Ordering::SeqCst);
                tracing::info!("Key listener thread stopped");
            })?;

        *self.thread_handle.lock() = Some(handle);

        tracing::info!("Keyboard tracking started");
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        self.handler.deactivate();
        self.is_recording.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                // OS hooks may block forever; the deactivated handler ignores them.
                tracing::debug!("Detaching key listener thread");
            }
        }

        tracing::info!("Keyboard tracking stopped");
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn output_files(&self) -> Vec<String> {
        Vec::new()
    }
}
