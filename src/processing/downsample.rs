//! Box-filter downsampling
//!
//! Each output pixel averages the source pixels under its footprint, which keeps
//! fine texture from aliasing when a large capture is shrunk to model resolution.

use crate::recorder::channel::{RecordingError, RecordingResult};
use fast_image_resize::images::Image as FirImage;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

/// Resize `src` to `width`x`height` with a box filter.
///
/// Returns the input untouched when the size is unchanged.
pub fn resize_area(src: RgbImage, width: u32, height: u32) -> RecordingResult<RgbImage> {
    if src.dimensions() == (width, height) {
        return Ok(src);
    }
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return Err(RecordingError::CaptureError(format!(
            "Cannot resize {}x{} to {}x{}",
            src.width(),
            src.height(),
            width,
            height
        )));
    }

    let (src_width, src_height) = src.dimensions();
    let src_image = FirImage::from_vec_u8(src_width, src_height, src.into_raw(), PixelType::U8x3)
        .map_err(|e| RecordingError::CaptureError(format!("Resize source init failed: {}", e)))?;
    let mut dst_image = FirImage::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| RecordingError::CaptureError(format!("Resize failed: {}", e)))?;

    RgbImage::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
        RecordingError::CaptureError("Resized buffer shape mismatch".to_string())
    })
}
