//! Monitor capture via xcap
//!
//! The region is expressed in desktop coordinates. Each grab captures the monitor
//! that contains the region's top-left corner and crops the region out of it,
//! scaling the crop rectangle when the monitor reports a HiDPI backing store.

use super::{CapturedFrame, FrameSource, PixelFormat};
use crate::config::CaptureRegion;
use crate::recorder::channel::{RecordingError, RecordingResult};
use xcap::Monitor;

pub struct ScreenRegionSource {
    region: CaptureRegion,
}

impl ScreenRegionSource {
    pub fn new(region: CaptureRegion) -> Self {
        Self { region }
    }

    fn monitor(&self) -> RecordingResult<Monitor> {
        Monitor::from_point(self.region.left, self.region.top).map_err(|e| {
            RecordingError::CaptureError(format!(
                "No monitor at ({}, {}): {}",
                self.region.left, self.region.top, e
            ))
        })
    }
}

impl FrameSource for ScreenRegionSource {
    fn prepare(&mut self) -> RecordingResult<()> {
        let monitor = self.monitor().map_err(|e| {
            RecordingError::ConfigurationError(format!("Invalid capture region: {}", e))
        })?;

        let right = monitor.x() as i64 + monitor.width() as i64;
        let bottom = monitor.y() as i64 + monitor.height() as i64;
        let region_right = self.region.left as i64 + self.region.width as i64;
        let region_bottom = self.region.top as i64 + self.region.height as i64;

        if region_right > right || region_bottom > bottom {
            return Err(RecordingError::ConfigurationError(format!(
                "Capture region {:?} extends beyond monitor '{}' ({}x{} at {},{})",
                self.region,
                monitor.name(),
                monitor.width(),
                monitor.height(),
                monitor.x(),
                monitor.y()
            )));
        }

        tracing::info!(
            "Capturing {}x{} at ({}, {}) from monitor '{}'",
            self.region.width,
            self.region.height,
            self.region.left,
            self.region.top,
            monitor.name()
        );
        Ok(())
    }

    fn grab(&mut self) -> RecordingResult<CapturedFrame> {
        let monitor = self.monitor()?;
        let image = monitor
            .capture_image()
            .map_err(|e| RecordingError::CaptureError(format!("Monitor capture failed: {}", e)))?;

        let scale = image.width() as f64 / monitor.width().max(1) as f64;
        let scaled = |v: f64| (v * scale).round() as u32;

        let x = scaled((self.region.left - monitor.x()) as f64);
        let y = scaled((self.region.top - monitor.y()) as f64);
        let width = scaled(self.region.width as f64).min(image.width().saturating_sub(x));
        let height = scaled(self.region.height as f64).min(image.height().saturating_sub(y));
        if width == 0 || height == 0 {
            return Err(RecordingError::CaptureError(
                "Capture region fell outside the captured monitor image".to_string(),
            ));
        }

        let cropped = image::imageops::crop_imm(&image, x, y, width, height).to_image();
        Ok(CapturedFrame::packed(
            cropped.into_raw(),
            width,
            height,
            PixelFormat::Rgba,
        ))
    }
}
