// THEORY:
// The `pipeline` module is the top-level API of the risk engine. It composes the
// two analysers into a single call so callers never have to coordinate them:
//
//   decoded image -> RGB coercion -> risk classification -> brightness histogram
//
// The composition is atomic. If the image is invalid nothing is returned, not a
// histogram without verdicts or verdicts without a histogram. Like the
// analysers it wraps, the pipeline is pure and holds no state between calls.

use crate::core_modules::brightness_histogram::build_histogram_rgb;
use crate::core_modules::image_source;
use crate::core_modules::risk_classifier::classify_rgb;
use crate::error::Result;
use image::{DynamicImage, RgbImage};

// Re-export key data structures for the public API.
pub use crate::core_modules::brightness_histogram::HistogramCounts;
pub use crate::core_modules::color_mask::color_mask::{ColorPredicate, Percentage};
pub use crate::core_modules::risk_classifier::{
    RiskAssessment, RiskCategory, RiskPercentages, RiskVerdicts, Verdict,
};
pub use crate::error::InvalidImageError;

/// The complete result of analysing one image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub width: u32,
    pub height: u32,
    pub assessment: RiskAssessment,
    pub histogram: HistogramCounts,
}

impl AnalysisReport {
    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn percentages(&self) -> &RiskPercentages {
        &self.assessment.percentages
    }

    pub fn verdicts(&self) -> &RiskVerdicts {
        &self.assessment.verdicts
    }

    /// True when at least one risk category was found.
    pub fn risk_detected(&self) -> bool {
        self.assessment.verdicts.found().next().is_some()
    }

    pub fn found_risks(&self) -> Vec<RiskCategory> {
        self.assessment.verdicts.found().collect()
    }
}

/// Runs classification and histogram construction on a decoded image.
pub fn analyze_image(image: &DynamicImage) -> Result<AnalysisReport> {
    let rgb = image_source::to_rgb(image)?;
    analyze_rgb(&rgb)
}

/// Runs both analysers on an image that is already 8-bit RGB.
pub fn analyze_rgb(image: &RgbImage) -> Result<AnalysisReport> {
    // Classification validates the image; the histogram only runs on success.
    let assessment = classify_rgb(image)?;
    let histogram = build_histogram_rgb(image);

    Ok(AnalysisReport {
        width: image.width(),
        height: image.height(),
        assessment,
        histogram,
    })
}

/// Decodes encoded image bytes and analyses the result.
pub fn analyze_bytes(bytes: &[u8]) -> Result<AnalysisReport> {
    let image = image_source::decode_image(bytes)?;
    analyze_image(&image)
}
