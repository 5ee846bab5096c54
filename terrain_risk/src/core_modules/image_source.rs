// THEORY:
// Everything the engine measures is measured on an 8-bit RGB grid. This module
// is the one place where foreign data is coerced into that shape: encoded bytes
// are decoded, `DynamicImage`s of any colour type are converted, and raw
// interleaved frame buffers (gray, gray+alpha, RGB, RGBA) are repacked. Alpha is
// dropped and gray is replicated across channels; no colour correction happens.
// Anything that cannot be coerced, or that has no pixels, is rejected here with
// an `InvalidImageError` so the analysers never see it.

use crate::error::{InvalidImageError, Result};
use image::{DynamicImage, RgbImage};
use std::borrow::Cow;

/// Decodes encoded image bytes (PNG, JPEG, ...) by sniffing their format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    tracing::trace!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded image"
    );
    Ok(image)
}

/// Coerces any decoded image to 8-bit RGB and rejects images without pixels.
/// Images that are already RGB are borrowed, not copied.
pub fn to_rgb(image: &DynamicImage) -> Result<Cow<'_, RgbImage>> {
    ensure_not_empty(image.width(), image.height())?;
    Ok(match image {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        other => Cow::Owned(other.to_rgb8()),
    })
}

/// Repacks a raw interleaved buffer into an RGB image.
///
/// Supported layouts by channel count: 1 (gray), 2 (gray + alpha), 3 (RGB),
/// 4 (RGBA).
pub fn rgb_from_raw(width: u32, height: u32, channels: usize, bytes: &[u8]) -> Result<RgbImage> {
    if !(1..=4).contains(&channels) {
        return Err(InvalidImageError::UnsupportedLayout { channels });
    }
    let expected = width as usize * height as usize * channels;
    if bytes.len() != expected {
        return Err(InvalidImageError::BufferLength {
            expected,
            actual: bytes.len(),
        });
    }
    ensure_not_empty(width, height)?;

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for sample in bytes.chunks_exact(channels) {
        match channels {
            1 | 2 => rgb.extend_from_slice(&[sample[0], sample[0], sample[0]]),
            _ => rgb.extend_from_slice(&sample[..3]),
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or(InvalidImageError::BufferLength {
        expected,
        actual: bytes.len(),
    })
}

pub(crate) fn ensure_not_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(InvalidImageError::Empty { width, height });
    }
    Ok(())
}
