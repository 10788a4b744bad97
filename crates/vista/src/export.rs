//! PNG export of a finished frame.

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};
use vista_core::FrameView;
use vista_procedural::unpack;

/// Copies packed RGBA pixels into an image.
///
/// Returns `None` if `pixels` is shorter than `width * height`.
#[must_use]
pub fn to_image(pixels: &[u32], width: usize, height: usize) -> Option<RgbaImage> {
    if pixels.len() < width.checked_mul(height)? {
        return None;
    }
    let w = u32::try_from(width).ok()?;
    let h = u32::try_from(height).ok()?;
    Some(ImageBuffer::from_fn(w, h, |x, y| {
        Rgba(unpack(pixels[y as usize * width + x as usize]))
    }))
}

/// Writes the viewed frame to `path` as PNG.
///
/// # Errors
///
/// Returns the encoder or filesystem error.
pub fn save_png(view: &FrameView<'_>, path: &Path) -> image::ImageResult<()> {
    let (width, height) = (view.width(), view.height());
    let img = to_image(view, width, height).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    img.save(path)?;
    tracing::info!("Wrote frame {} ({}x{}) to {}", view.frame_count(), width, height, path.display());
    Ok(())
}
