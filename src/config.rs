//! Run configuration
//!
//! A `RunConfig` is built once before a run starts and shared read-only by every
//! component. It is loaded from JSON when a config file is present and falls back
//! to the stock Stardew-style bindings otherwise.

use crate::recorder::channel::{RecordingError, RecordingResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TELEOP_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "teleop.json";

/// Frame names are five zero-padded digits, so a run can hold at most this many steps
pub const MAX_STEPS_LIMIT: u32 = 100_000;

/// Rectangular screen region in source-resolution pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Output frame resolution, serialized as `[width, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize(pub u32, pub u32);

impl OutputSize {
    pub fn width(&self) -> u32 {
        self.0
    }

    pub fn height(&self) -> u32 {
        self.1
    }
}

/// One action channel and the raw key names that activate it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeymapEntry {
    pub name: String,
    pub aliases: BTreeSet<String>,
}

impl KeymapEntry {
    pub fn new<I, S>(name: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable configuration for one recording run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub region: CaptureRegion,
    pub out_size: OutputSize,
    pub hz: f64,
    pub max_steps: u32,
    pub jpeg_quality: u8,
    pub start_delay_secs: f64,
    pub output_root: PathBuf,
    pub stop_key: String,
    pub keymap: Vec<KeymapEntry>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: CaptureRegion {
                left: 320,
                top: 212,
                width: 1280,
                height: 720,
            },
            out_size: OutputSize(320, 180),
            hz: 10.0,
            max_steps: 10_000,
            jpeg_quality: 90,
            start_delay_secs: 3.0,
            output_root: PathBuf::from("data").join("teleop"),
            stop_key: "esc".to_string(),
            keymap: default_keymap(),
        }
    }
}

/// Movement on WASD/arrows plus the common tool, interact, menu and run bindings
pub fn default_keymap() -> Vec<KeymapEntry> {
    vec![
        KeymapEntry::new("up", ["w", "up"]),
        KeymapEntry::new("down", ["s", "down"]),
        KeymapEntry::new("left", ["a", "left"]),
        KeymapEntry::new("right", ["d", "right"]),
        KeymapEntry::new("use_tool", ["mouse_left", "c"]),
        KeymapEntry::new("interact", ["x", "e", "enter"]),
        KeymapEntry::new("menu", ["esc", "tab"]),
        KeymapEntry::new("run", ["left_shift", "right_shift"]),
    ]
}

impl RunConfig {
    /// Resolve the config source: `TELEOP_CONFIG`, then `./teleop.json`, then defaults.
    pub fn load() -> RecordingResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        tracing::info!("No config file found, using built-in defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> RecordingResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RecordingError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: RunConfig = serde_json::from_str(&contents).map_err(|e| {
            RecordingError::ConfigurationError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Tick period derived from `hz`
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hz)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_secs_f64(self.start_delay_secs.max(0.0))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.keymap.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn validate(&self) -> RecordingResult<()> {
        let fail = |msg: String| Err(RecordingError::ConfigurationError(msg));

        if self.region.width == 0 || self.region.height == 0 {
            return fail(format!(
                "Capture region must have a positive size, got {}x{}",
                self.region.width, self.region.height
            ));
        }
        if self.out_size.width() == 0 || self.out_size.height() == 0 {
            return fail(format!(
                "Output size must be positive, got {}x{}",
                self.out_size.width(),
                self.out_size.height()
            ));
        }
        if !self.hz.is_finite() || self.hz <= 0.0 {
            return fail(format!("Sampling rate must be positive, got {}", self.hz));
        }
        if Duration::try_from_secs_f64(1.0 / self.hz).is_err() {
            return fail(format!("Sampling rate {} Hz is too low to schedule", self.hz));
        }
        if !self.start_delay_secs.is_finite()
            || self.start_delay_secs < 0.0
            || Duration::try_from_secs_f64(self.start_delay_secs).is_err()
        {
            return fail(format!(
                "start_delay_secs must be a non-negative number of seconds, got {}",
                self.start_delay_secs
            ));
        }
        if self.max_steps == 0 || self.max_steps > MAX_STEPS_LIMIT {
            return fail(format!(
                "max_steps must be between 1 and {}, got {}",
                MAX_STEPS_LIMIT, self.max_steps
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return fail(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        if self.stop_key.trim().is_empty() {
            return fail("stop_key must not be empty".to_string());
        }
        if self.keymap.is_empty() {
            return fail("Keymap must define at least one channel".to_string());
        }

        let mut seen = HashSet::new();
        for entry in &self.keymap {
            if entry.name.trim().is_empty() {
                return fail("Keymap channel names must not be empty".to_string());
            }
            if !seen.insert(entry.name.as_str()) {
                return fail(format!("Duplicate keymap channel '{}'", entry.name));
            }
            if entry.aliases.is_empty() {
                return fail(format!("Keymap channel '{}' has no aliases", entry.name));
            }
        }

        Ok(())
    }
}
