// THEORY:
// The brightness histogram is the engine's second, independent view of an
// image: every pixel is reduced to a single integer intensity (Rec. 601 luma,
// see `Pixel::gray`) and counted into one of 256 buckets. The output is meant
// for visual inspection, so the module only counts; turning the counts into a
// chart is the presentation layer's job.
//
// Invariant: the buckets always sum to exactly width * height. An image with no
// pixels therefore produces 256 empty buckets rather than an error.

use crate::core_modules::pixel::pixel::{Intensity, Pixel};
use image::{DynamicImage, GrayImage, RgbImage};
use std::ops::Index;

pub const BUCKETS: usize = 256;

pub type Count = u64;

/// Per-intensity pixel counts; index `i` holds the number of pixels whose
/// grayscale intensity equals `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramCounts {
    buckets: [Count; BUCKETS],
}

impl Default for HistogramCounts {
    fn default() -> Self {
        Self { buckets: [0; BUCKETS] }
    }
}

impl HistogramCounts {
    /// Counts an iterator of intensities.
    pub fn from_intensities<I>(intensities: I) -> Self
    where
        I: IntoIterator<Item = Intensity>,
    {
        let mut histogram = Self::default();
        for intensity in intensities {
            histogram.buckets[intensity as usize] += 1;
        }
        histogram
    }

    pub fn as_slice(&self) -> &[Count] {
        &self.buckets
    }

    pub fn to_vec(&self) -> Vec<Count> {
        self.buckets.to_vec()
    }

    /// Total number of counted pixels.
    pub fn total(&self) -> Count {
        self.buckets.iter().sum()
    }

    /// The largest single bucket, used to scale charts.
    pub fn max_count(&self) -> Count {
        self.buckets.iter().copied().max().unwrap_or(0)
    }

    /// The most populated intensity. Ties go to the darker value.
    pub fn peak(&self) -> Option<Intensity> {
        let max = self.max_count();
        if max == 0 {
            return None;
        }
        self.buckets
            .iter()
            .position(|&count| count == max)
            .map(|index| index as Intensity)
    }

    /// Mean intensity across all counted pixels.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self
            .buckets
            .iter()
            .enumerate()
            .map(|(intensity, &count)| intensity as f64 * count as f64)
            .sum();
        Some(weighted / total as f64)
    }
}

impl Index<Intensity> for HistogramCounts {
    type Output = Count;

    fn index(&self, intensity: Intensity) -> &Count {
        &self.buckets[intensity as usize]
    }
}

/// Builds the brightness histogram of a decoded image of any colour type.
pub fn build_histogram(image: &DynamicImage) -> HistogramCounts {
    match image {
        DynamicImage::ImageLuma8(gray) => build_histogram_luma(gray),
        DynamicImage::ImageRgb8(rgb) => build_histogram_rgb(rgb),
        other => build_histogram_rgb(&other.to_rgb8()),
    }
}

/// Builds the histogram of an RGB image, reducing each pixel to its luma.
pub fn build_histogram_rgb(image: &RgbImage) -> HistogramCounts {
    let histogram = HistogramCounts::from_intensities(image.pixels().map(|rgb| Pixel::from(rgb).gray()));
    tracing::trace!(total = histogram.total(), peak = ?histogram.peak(), "built histogram");
    histogram
}

/// Builds the histogram of an image that is already single-channel.
pub fn build_histogram_luma(image: &GrayImage) -> HistogramCounts {
    HistogramCounts::from_intensities(image.pixels().map(|luma| luma.0[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn sums_to_pixel_count() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(37, 11, |x, y| {
            Rgb([(x * 7) as u8, (y * 23) as u8, (x * y) as u8])
        }));
        let histogram = build_histogram(&image);
        assert_eq!(histogram.total(), 37 * 11);
        assert_eq!(histogram.as_slice().len(), BUCKETS);
    }

    #[test]
    fn single_pixel_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
        let histogram = build_histogram(&image);
        assert_eq!(histogram.total(), 1);
        assert_eq!(histogram[255], 1);
        assert_eq!(histogram.peak(), Some(255));
    }

    #[test]
    fn solid_colour_fills_one_bucket() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 255, 0])));
        let histogram = build_histogram(&image);
        assert_eq!(histogram[150], 100);
        assert_eq!(histogram.max_count(), 100);
        assert_eq!(histogram.mean(), Some(150.0));
    }

    #[test]
    fn gray_input_is_counted_directly() {
        let gray = GrayImage::from_fn(256, 2, |x, _| Luma([x as u8]));
        let histogram = build_histogram(&DynamicImage::ImageLuma8(gray));
        assert!(histogram.as_slice().iter().all(|&count| count == 2));
        assert_eq!(histogram.total(), 512);
    }

    #[test]
    fn gray_rgb_and_luma_agree() {
        let rgb = RgbImage::from_fn(16, 16, |x, y| {
            let value = (x * 16 + y) as u8;
            Rgb([value, value, value])
        });
        let luma = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 16 + y) as u8]));
        assert_eq!(build_histogram_rgb(&rgb), build_histogram_luma(&luma));
    }

    #[test]
    fn alpha_does_not_change_brightness() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0])));
        let histogram = build_histogram(&rgba);
        assert_eq!(histogram[0], 9);
    }

    #[test]
    fn empty_image_yields_empty_buckets() {
        let histogram = build_histogram(&DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        assert_eq!(histogram, HistogramCounts::default());
        assert_eq!(histogram.total(), 0);
        assert_eq!(histogram.peak(), None);
        assert_eq!(histogram.mean(), None);
    }

    #[test]
    fn repeated_calls_agree() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(9, 9, |x, y| Rgb([x as u8 * 20, y as u8 * 20, 7])));
        assert_eq!(build_histogram(&image), build_histogram(&image));
    }
}
