use crate::recorder::channel::{RecordingError, RecordingResult};
use image::{Rgb, RgbImage};

/// Byte order of a 4-byte-per-pixel capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra,
    Rgba,
}

/// Frame data from a capture source
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw pixel data, 4 bytes per pixel
    pub data: Vec<u8>,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Bytes per row (may include padding)
    pub bytes_per_row: u32,

    /// Channel order of `data`
    pub format: PixelFormat,
}

impl CapturedFrame {
    /// Tightly packed frame with no row padding
    pub fn packed(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            bytes_per_row: width * 4,
            format,
        }
    }

    /// Drop alpha and reorder to RGB, skipping any row padding.
    pub fn to_rgb(&self) -> RecordingResult<RgbImage> {
        if self.width == 0 || self.height == 0 {
            return Err(RecordingError::CaptureError(format!(
                "Empty frame {}x{}",
                self.width, self.height
            )));
        }

        let row_bytes = self.width as usize * 4;
        let stride = self.bytes_per_row as usize;
        if stride < row_bytes {
            return Err(RecordingError::CaptureError(format!(
                "Row stride {} is smaller than {} bytes for width {}",
                stride, row_bytes, self.width
            )));
        }

        let needed = stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return Err(RecordingError::CaptureError(format!(
                "Frame buffer holds {} bytes, expected at least {} for {}x{}",
                self.data.len(),
                needed,
                self.width,
                self.height
            )));
        }

        let (r, b) = match self.format {
            PixelFormat::Bgra => (2, 0),
            PixelFormat::Rgba => (0, 2),
        };

        let mut img = RgbImage::new(self.width, self.height);
        for (y, row) in self.data.chunks(stride).take(self.height as usize).enumerate() {
            for (x, px) in row[..row_bytes].chunks_exact(4).enumerate() {
                img.put_pixel(x as u32, y as u32, Rgb([px[r], px[1], px[b]]));
            }
        }

        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_is_reordered() {
        let frame = CapturedFrame::packed(vec![1, 2, 3, 255, 4, 5, 6, 255], 2, 1, PixelFormat::Bgra);
        let img = frame.to_rgb().unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([3, 2, 1]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([6, 5, 4]));
    }

    #[test]
    fn test_rgba_keeps_order() {
        let frame = CapturedFrame::packed(vec![1, 2, 3, 0], 1, 1, PixelFormat::Rgba);
        assert_eq!(frame.to_rgb().unwrap().get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_row_padding_is_skipped() {
        // 1x2 frame with 8-byte stride, last row unpadded
        let frame = CapturedFrame {
            data: vec![10, 20, 30, 0, 99, 99, 99, 99, 40, 50, 60, 0],
            width: 1,
            height: 2,
            bytes_per_row: 8,
            format: PixelFormat::Rgba,
        };
        let img = frame.to_rgb().unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(img.get_pixel(0, 1), &Rgb([40, 50, 60]));
    }

    #[test]
    fn test_short_buffer_is_capture_error() {
        let frame = CapturedFrame::packed(vec![0; 7], 2, 1, PixelFormat::Bgra);
        assert!(matches!(
            frame.to_rgb(),
            Err(RecordingError::CaptureError(_))
        ));
    }
}
