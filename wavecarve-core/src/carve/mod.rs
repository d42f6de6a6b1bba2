//! Width editing of spectrograms through a pluggable resizer.
//!
//! The resizer sees only the spectrum pixels as an alpha-less RGB image; the
//! header is held aside and reattached, so no seam can ever remove it.

pub mod seam;

use image::RgbImage;

use crate::spectrogram::Spectrogram;
use crate::{Result, WavecarveError};

pub use seam::SeamCarver;

/// Capability interface for anything that can change an image's width.
///
/// Implementations must return an image of the same height. The requested
/// width may be clamped by the implementation's own policy, but must stay
/// at least 1.
pub trait WidthResizer {
    fn resize(&self, image: &RgbImage, target_width: u32) -> Result<RgbImage>;
}

impl<T: WidthResizer + ?Sized> WidthResizer for &T {
    fn resize(&self, image: &RgbImage, target_width: u32) -> Result<RgbImage> {
        (**self).resize(image, target_width)
    }
}

/// `floor(width * percent / 100)`, at least 1.
pub fn target_width(width: usize, percent: f32) -> Result<u32> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(WavecarveError::Transform(format!(
            "width percentage must be positive, got {}",
            percent
        )));
    }
    let target = (width as f64 * percent as f64 / 100.0).floor();
    if target > u32::MAX as f64 {
        return Err(WavecarveError::Transform(format!(
            "target width {} is too large",
            target
        )));
    }
    Ok((target as u32).max(1))
}

/// Resizes the spectrogram to `percent` of its width with `resizer`.
///
/// A zero-width spectrogram has nothing to resize and is returned as is.
pub fn resize_width<R: WidthResizer + ?Sized>(
    spectrogram: &Spectrogram,
    resizer: &R,
    percent: f32,
) -> Result<Spectrogram> {
    let target = target_width(spectrogram.width(), percent)?;
    if spectrogram.width() == 0 {
        return Ok(spectrogram.clone());
    }

    let height = spectrogram.height() as u32;
    tracing::info!(
        from = spectrogram.width(),
        to = target,
        percent,
        "resizing spectrogram width"
    );

    let resized = resizer.resize(&spectrogram.to_rgb(), target)?;
    let (width, resized_height) = resized.dimensions();
    if resized_height != height {
        return Err(WavecarveError::Transform(format!(
            "resizer changed height from {} to {}",
            height, resized_height
        )));
    }
    if width == 0 {
        return Err(WavecarveError::Transform(
            "resizer produced an empty image".into(),
        ));
    }

    Spectrogram::from_rgb(&resized, *spectrogram.header(), spectrogram.frame_size())
}
