// Renders `HistogramCounts` as a gray bar chart: one column per intensity
// bucket, scaled so the fullest bucket touches the top of the plot area, with a
// baseline, a left axis and ticks every 64 intensity levels.

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;
use terrain_risk::core_modules::brightness_histogram::{BUCKETS, HistogramCounts};

const MARGIN: u32 = 32;
const TICK_LENGTH: u32 = 6;
const TICK_EVERY: u32 = 64;
const MIN_WIDTH: u32 = 2 * MARGIN + BUCKETS as u32;
const MIN_HEIGHT: u32 = 2 * MARGIN + 64;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR: Rgb<u8> = Rgb([128, 128, 128]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Pixel rectangle the bars are drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl PlotArea {
    fn for_size(width: u32, height: u32) -> Self {
        Self {
            left: MARGIN,
            right: width - MARGIN,
            top: MARGIN,
            bottom: height - MARGIN,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Horizontal pixel span `[start, end)` of one bucket.
    pub fn bucket_span(&self, bucket: usize) -> (u32, u32) {
        let start = self.left + (bucket as u32 * self.width()) / BUCKETS as u32;
        let end = self.left + ((bucket as u32 + 1) * self.width()) / BUCKETS as u32;
        (start, end.max(start + 1).min(self.right))
    }
}

/// Draws the histogram. Sizes below the minimum are enlarged so every bucket
/// gets at least one pixel column.
pub fn render_histogram(histogram: &HistogramCounts, style: &ChartStyle) -> (RgbImage, PlotArea) {
    let width = style.width.max(MIN_WIDTH);
    let height = style.height.max(MIN_HEIGHT);
    let mut chart = RgbImage::from_pixel(width, height, BACKGROUND);
    let plot = PlotArea::for_size(width, height);

    let max = histogram.max_count();
    if max > 0 {
        for (bucket, &count) in histogram.as_slice().iter().enumerate() {
            if count == 0 {
                continue;
            }
            let scaled = (count as f64 / max as f64 * plot.height() as f64).round() as u32;
            let bar_height = scaled.clamp(1, plot.height());
            let (start, end) = plot.bucket_span(bucket);
            let bar = Rect::at(start as i32, (plot.bottom - bar_height) as i32).of_size(end - start, bar_height);
            draw_filled_rect_mut(&mut chart, bar, BAR);
        }
    }

    let (left, right) = (plot.left as f32, plot.right as f32);
    let (top, bottom) = (plot.top as f32, plot.bottom as f32);
    draw_line_segment_mut(&mut chart, (left, bottom), (right, bottom), AXIS);
    draw_line_segment_mut(&mut chart, (left - 1.0, top), (left - 1.0, bottom), AXIS);
    for intensity in (0..BUCKETS as u32).step_by(TICK_EVERY as usize).chain([BUCKETS as u32 - 1]) {
        let (x, _) = plot.bucket_span(intensity as usize);
        let x = x as f32;
        draw_line_segment_mut(&mut chart, (x, bottom), (x, bottom + TICK_LENGTH as f32), AXIS);
    }

    (chart, plot)
}

/// Encodes an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::error::ImageError> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(&mut bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Writes an RGB image to `path` as PNG.
pub fn save_png(path: &Path, image: &RgbImage) -> Result<(), image::error::ImageError> {
    let output = std::fs::File::create(path)?;
    let encoder = PngEncoder::new(output);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

/// Renders the histogram straight to PNG bytes with the default style.
pub fn histogram_png(histogram: &HistogramCounts) -> Result<Vec<u8>, image::error::ImageError> {
    let (chart, _) = render_histogram(histogram, &ChartStyle::default());
    encode_png(&chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use terrain_risk::build_histogram;

    fn histogram_of(width: u32, height: u32, rgb: [u8; 3]) -> HistogramCounts {
        build_histogram(&DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb))))
    }

    #[test]
    fn small_styles_are_enlarged() {
        let (chart, plot) = render_histogram(&HistogramCounts::default(), &ChartStyle { width: 10, height: 10 });
        assert_eq!(chart.dimensions(), (MIN_WIDTH, MIN_HEIGHT));
        assert_eq!(plot.width(), BUCKETS as u32);
    }

    #[test]
    fn empty_histogram_draws_no_bars() {
        let (chart, _) = render_histogram(&HistogramCounts::default(), &ChartStyle::default());
        assert!(chart.pixels().all(|pixel| *pixel != BAR));
    }

    #[test]
    fn fullest_bucket_reaches_the_top() {
        // Pure white lands in bucket 255.
        let histogram = histogram_of(4, 4, [255, 255, 255]);
        let (chart, plot) = render_histogram(&histogram, &ChartStyle::default());
        let (start, _) = plot.bucket_span(255);

        assert_eq!(*chart.get_pixel(start, plot.top), BAR);
        assert_eq!(*chart.get_pixel(start, plot.bottom - 1), BAR);
        let (first, _) = plot.bucket_span(0);
        assert_eq!(*chart.get_pixel(first, plot.bottom - 1), BACKGROUND);
    }

    #[test]
    fn axes_and_ticks_are_drawn() {
        let (chart, plot) = render_histogram(&HistogramCounts::default(), &ChartStyle::default());

        assert_eq!(*chart.get_pixel(plot.left, plot.bottom), AXIS);
        assert_eq!(*chart.get_pixel(plot.right, plot.bottom), AXIS);
        assert_eq!(*chart.get_pixel(plot.left - 1, plot.top), AXIS);
        let (tick, _) = plot.bucket_span(128);
        assert_eq!(*chart.get_pixel(tick, plot.bottom + TICK_LENGTH), AXIS);
        assert_eq!(*chart.get_pixel(tick + 1, plot.bottom + TICK_LENGTH), BACKGROUND);
    }

    #[test]
    fn bars_fill_their_bucket_span() {
        let mut counts = [0u64; BUCKETS];
        counts[10] = 4;
        counts[20] = 2;
        let histogram = HistogramCounts::from_intensities(
            counts
                .iter()
                .enumerate()
                .flat_map(|(intensity, &count)| std::iter::repeat_n(intensity as u8, count as usize)),
        );
        let (chart, plot) = render_histogram(&histogram, &ChartStyle::default());

        let (start, end) = plot.bucket_span(20);
        let half = plot.bottom - plot.height() / 2;
        for x in start..end {
            assert_eq!(*chart.get_pixel(x, half), BAR);
            assert_eq!(*chart.get_pixel(x, half - 2), BACKGROUND);
        }
    }

    #[test]
    fn bucket_spans_tile_the_plot() {
        let plot = PlotArea::for_size(640, 480);
        let mut previous_end = plot.left;
        for bucket in 0..BUCKETS {
            let (start, end) = plot.bucket_span(bucket);
            assert!(start >= previous_end.saturating_sub(1));
            assert!(end > start);
            assert!(end <= plot.right);
            previous_end = end;
        }
    }

    #[test]
    fn png_round_trips_dimensions() {
        let bytes = histogram_png(&histogram_of(3, 3, [10, 200, 30])).expect("encode");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
    }
}
