//! Rollout storage
//!
//! On-disk layout of one run:
//!
//! ```text
//! <output_root>/<run_id>/
//!   rollout.json
//!   frames/00000.jpg, 00001.jpg, ...
//! ```
//!
//! Frames are written as the run progresses. `rollout.json` is written once, by
//! `RolloutRecorder::finalize`, through a temp file and rename, so a manifest
//! that parses always refers to frames that already exist. A run killed before
//! finalize leaves frames and no manifest.

use crate::config::{CaptureRegion, KeymapEntry, OutputSize, RunConfig};
use crate::processing::action::ActionVector;
use crate::recorder::channel::{RecordingError, RecordingResult};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "rollout.json";
pub const FRAMES_DIR: &str = "frames";

/// Format of run directory names; lexical order equals chronological order
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One sampled tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub t: u64,
    pub time_unix: f64,
    pub held_keys: Vec<String>,
    pub action: ActionVector,
    pub frame: String,
}

/// Run-level manifest, serialized as `rollout.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutMetadata {
    pub region: CaptureRegion,
    pub out_size: OutputSize,
    pub hz: f64,
    pub keymap: Vec<KeymapEntry>,
    pub start_time_unix: f64,
    pub steps: Vec<StepRecord>,
}

impl RolloutMetadata {
    /// Parse the sealed manifest of a run directory
    pub fn load(run_dir: &Path) -> RecordingResult<Self> {
        let data = std::fs::read(run_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Seconds since the unix epoch with microsecond resolution
pub fn unix_time_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Relative path of the frame for step `t`
pub fn frame_path(t: u64) -> String {
    format!("{}/{:05}.jpg", FRAMES_DIR, t)
}

/// Pick a fresh run directory under `root` named after the current local time.
///
/// If a run with the same second already exists, `_1`, `_2`, ... is appended.
/// The directory itself is not created.
pub fn allocate_run_dir(root: &Path) -> PathBuf {
    let base = chrono::Local::now().format(RUN_ID_FORMAT).to_string();
    let mut candidate = root.join(&base);
    let mut suffix = 1;
    while candidate.exists() {
        candidate = root.join(format!("{}_{}", base, suffix));
        suffix += 1;
    }
    candidate
}

/// Most recent run under `root`, by lexical max of the directory name
pub fn latest_run(root: &Path) -> RecordingResult<Option<PathBuf>> {
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            runs.push(entry.path());
        }
    }
    runs.sort();
    Ok(runs.pop())
}

/// Accumulates the steps of one run and writes its frames.
///
/// Only the sampler appends, so no internal locking is needed.
pub struct RolloutRecorder {
    run_dir: PathBuf,
    frames_dir: PathBuf,
    jpeg_quality: u8,
    metadata: RolloutMetadata,
}

impl RolloutRecorder {
    /// Create the run directory and its frames folder
    pub fn create(run_dir: &Path, config: &RunConfig) -> RecordingResult<Self> {
        let frames_dir = run_dir.join(FRAMES_DIR);
        std::fs::create_dir_all(&frames_dir)?;

        tracing::info!("Recording rollout to {}", run_dir.display());

        Ok(Self {
            run_dir: run_dir.to_path_buf(),
            frames_dir,
            jpeg_quality: config.jpeg_quality,
            metadata: RolloutMetadata {
                region: config.region,
                out_size: config.out_size,
                hz: config.hz,
                keymap: config.keymap.clone(),
                start_time_unix: unix_time_now(),
                steps: Vec::new(),
            },
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.metadata.steps
    }

    /// Index the next appended step will get
    pub fn next_index(&self) -> u64 {
        self.metadata.steps.len() as u64
    }

    /// Encode `frame` as JPEG under the name for step `t`, returning the relative path.
    pub fn write_frame(&self, t: u64, frame: &RgbImage) -> RecordingResult<String> {
        let relative = frame_path(t);
        let path = self.frames_dir.join(format!("{:05}.jpg", t));

        // Encode next to the target and rename, so a failed write leaves no frame behind
        let tmp = tempfile::NamedTempFile::new_in(&self.frames_dir)?;
        let mut writer = BufWriter::new(tmp);
        JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality)
            .encode_image(frame)
            .map_err(|e| RecordingError::EncodingError(format!("JPEG encode failed: {}", e)))?;
        let tmp = writer
            .into_inner()
            .map_err(|e| RecordingError::IoError(e.into_error()))?;
        tmp.persist(&path).map_err(|e| RecordingError::IoError(e.error))?;

        Ok(relative)
    }

    /// Append a step. Steps must arrive with consecutive `t` starting at 0.
    pub fn append(&mut self, step: StepRecord) {
        debug_assert_eq!(step.t, self.next_index());
        self.metadata.steps.push(step);
    }

    /// Relative paths of every frame referenced so far
    pub fn frame_files(&self) -> Vec<String> {
        self.metadata.steps.iter().map(|s| s.frame.clone()).collect()
    }

    /// Seal the run: write `rollout.json` atomically. Consumes the recorder.
    pub fn finalize(self) -> RecordingResult<PathBuf> {
        let manifest_path = self.run_dir.join(MANIFEST_FILE);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.run_dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.metadata)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&manifest_path).map_err(|e| RecordingError::IoError(e.error))?;

        tracing::info!(
            "Saved rollout manifest with {} steps to {}",
            self.metadata.steps.len(),
            manifest_path.display()
        );
        Ok(manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn test_config() -> RunConfig {
        RunConfig {
            keymap: vec![
                KeymapEntry::new("up", ["w", "up"]),
                KeymapEntry::new("run", ["left_shift"]),
            ],
            ..RunConfig::default()
        }
    }

    fn step(t: u64, action: Vec<u8>) -> StepRecord {
        StepRecord {
            t,
            time_unix: 1_700_000_000.0 + t as f64 * 0.1,
            held_keys: vec!["w".to_string()],
            action,
            frame: frame_path(t),
        }
    }

    #[test]
    fn test_frame_paths_are_zero_padded() {
        assert_eq!(frame_path(0), "frames/00000.jpg");
        assert_eq!(frame_path(42), "frames/00042.jpg");
        assert!(frame_path(9) < frame_path(10));
    }

    #[test]
    fn test_no_manifest_before_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let mut recorder = RolloutRecorder::create(&run_dir, &test_config()).unwrap();

        let frame = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let rel = recorder.write_frame(0, &frame).unwrap();
        recorder.append(step(0, vec![1, 0]));

        assert!(run_dir.join(&rel).exists());
        assert!(!run_dir.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_finalize_writes_parsable_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let config = test_config();
        let mut recorder = RolloutRecorder::create(&run_dir, &config).unwrap();

        let frame = RgbImage::from_pixel(8, 4, Rgb([200, 100, 0]));
        for t in 0..3 {
            assert_eq!(recorder.next_index(), t);
            recorder.write_frame(t, &frame).unwrap();
            recorder.append(step(t, vec![1, (t % 2) as u8]));
        }

        let manifest_path = recorder.finalize().unwrap();
        assert_eq!(manifest_path, run_dir.join(MANIFEST_FILE));

        let meta = RolloutMetadata::load(&run_dir).unwrap();
        assert_eq!(meta.steps.len(), 3);
        assert_eq!(meta.keymap, config.keymap);
        assert_eq!(meta.out_size, OutputSize(320, 180));
        for s in &meta.steps {
            assert!(run_dir.join(&s.frame).exists());
            assert_eq!(s.action.len(), meta.keymap.len());
        }

        // Only the manifest and the frames folder remain; no temp files
        let entries: Vec<_> = std::fs::read_dir(&run_dir).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_manifest_keys_match_collaborator_contract() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let mut recorder = RolloutRecorder::create(&run_dir, &test_config()).unwrap();
        recorder
            .write_frame(0, &RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])))
            .unwrap();
        recorder.append(step(0, vec![1, 0]));
        recorder.finalize().unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(run_dir.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(raw["region"]["left"], 320);
        assert_eq!(raw["region"]["height"], 720);
        assert_eq!(raw["out_size"], serde_json::json!([320, 180]));
        assert_eq!(raw["hz"], 10.0);
        assert_eq!(raw["keymap"][0]["name"], "up");
        assert_eq!(raw["keymap"][0]["aliases"], serde_json::json!(["up", "w"]));
        assert!(raw["start_time_unix"].is_f64());
        let s = &raw["steps"][0];
        assert_eq!(s["t"], 0);
        assert_eq!(s["held_keys"], serde_json::json!(["w"]));
        assert_eq!(s["action"], serde_json::json!([1, 0]));
        assert_eq!(s["frame"], "frames/00000.jpg");
    }

    #[test]
    fn test_failed_frame_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RolloutRecorder::create(dir.path(), &test_config()).unwrap();

        let result = recorder.write_frame(0, &RgbImage::new(0, 0));
        assert!(matches!(result, Err(RecordingError::EncodingError(_))));
        assert_eq!(std::fs::read_dir(dir.path().join(FRAMES_DIR)).unwrap().count(), 0);
        assert!(recorder.frame_files().is_empty());
    }

    #[test]
    fn test_written_frame_decodes_at_output_size() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RolloutRecorder::create(dir.path(), &test_config()).unwrap();
        let rel = recorder
            .write_frame(7, &RgbImage::from_pixel(320, 180, Rgb([90, 90, 90])))
            .unwrap();

        let decoded = image::open(dir.path().join(rel)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 180));
    }

    #[test]
    fn test_allocate_run_dir_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let first = allocate_run_dir(dir.path());
        std::fs::create_dir_all(&first).unwrap();
        let second = allocate_run_dir(dir.path());

        assert_ne!(first, second);
        assert!(!second.exists());
        assert!(second > first);
    }

    #[test]
    fn test_latest_run_is_lexical_max() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_run(dir.path()).unwrap(), None);

        for name in ["20260225_142233", "20260301_090000", "20260225_235959"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(
            latest_run(dir.path()).unwrap(),
            Some(dir.path().join("20260301_090000"))
        );
    }
}
