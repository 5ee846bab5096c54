// THEORY:
// The `RiskClassifier` turns an image into three environmental-risk verdicts.
// It is a stateless, single-pass utility:
//
// 1.  **Coercion**: the image is brought to 8-bit RGB (see `image_source`).
// 2.  **Masking**: one `ColorMask` per `ColorPredicate` is evaluated over every
//     pixel. The masks are independent; they are never reconciled against one
//     another.
// 3.  **Aggregation**: each mask is reduced to the percentage of the image it
//     covers.
// 4.  **Verdicts**: each percentage is compared against a fixed threshold. The
//     thresholds are constants, not configuration, and the three verdicts are
//     always reported in the same order.
//
// The classifier has no memory and performs no I/O. Calling it twice on the
// same image yields the same assessment.

use crate::core_modules::color_mask::color_mask::{ColorMask, ColorPredicate, Percentage};
use crate::core_modules::image_source;
use crate::error::Result;
use image::{DynamicImage, RgbImage};
use std::fmt;

const DROUGHT_VEGETATION_CEILING: Percentage = 20.0;
const FLOOD_WATER_FLOOR: Percentage = 30.0;
const DEGRADATION_SOIL_FLOOR: Percentage = 50.0;

/// The three risk categories, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCategory {
    Drought,
    Flood,
    LandDegradation,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [
        RiskCategory::Drought,
        RiskCategory::Flood,
        RiskCategory::LandDegradation,
    ];

    /// Human-readable label used as the verdict key.
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Drought => "drought risk (low vegetation)",
            RiskCategory::Flood => "flood risk (excess water)",
            RiskCategory::LandDegradation => "land degradation (dry soil dominant)",
        }
    }

    /// The colour predicate whose coverage drives this category.
    pub fn predicate(&self) -> ColorPredicate {
        match self {
            RiskCategory::Drought => ColorPredicate::VegetationAbsence,
            RiskCategory::Flood => ColorPredicate::WaterPresence,
            RiskCategory::LandDegradation => ColorPredicate::BareSoil,
        }
    }

    fn assess(&self, percentages: &RiskPercentages) -> Verdict {
        let found = match self {
            RiskCategory::Drought => percentages.vegetation_absence < DROUGHT_VEGETATION_CEILING,
            RiskCategory::Flood => percentages.water_presence > FLOOD_WATER_FLOOR,
            RiskCategory::LandDegradation => percentages.bare_soil > DEGRADATION_SOIL_FLOOR,
        };
        Verdict::from(found)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Found / not-found conclusion for a single risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Found,
    NotFound,
}

impl Verdict {
    pub fn is_found(&self) -> bool {
        matches!(self, Verdict::Found)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Found => "found",
            Verdict::NotFound => "not found",
        }
    }
}

impl From<bool> for Verdict {
    fn from(found: bool) -> Self {
        if found { Verdict::Found } else { Verdict::NotFound }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Share of the image, in percent, covered by each colour mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPercentages {
    pub vegetation_absence: Percentage,
    pub water_presence: Percentage,
    pub bare_soil: Percentage,
}

impl RiskPercentages {
    pub fn for_predicate(&self, predicate: ColorPredicate) -> Percentage {
        match predicate {
            ColorPredicate::VegetationAbsence => self.vegetation_absence,
            ColorPredicate::WaterPresence => self.water_presence,
            ColorPredicate::BareSoil => self.bare_soil,
        }
    }
}

/// Ordered verdicts, one per `RiskCategory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskVerdicts {
    entries: [(RiskCategory, Verdict); 3],
}

impl RiskVerdicts {
    pub fn from_percentages(percentages: &RiskPercentages) -> Self {
        Self {
            entries: RiskCategory::ALL.map(|category| (category, category.assess(percentages))),
        }
    }

    pub fn get(&self, category: RiskCategory) -> Verdict {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == category)
            .map(|(_, verdict)| *verdict)
            .unwrap_or(Verdict::NotFound)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, Verdict)> + '_ {
        self.entries.iter().copied()
    }

    /// Label → "found"/"not found" pairs, in reporting order.
    pub fn labelled(&self) -> Vec<(&'static str, &'static str)> {
        self.iter()
            .map(|(category, verdict)| (category.label(), verdict.as_str()))
            .collect()
    }

    pub fn found(&self) -> impl Iterator<Item = RiskCategory> + '_ {
        self.iter()
            .filter(|(_, verdict)| verdict.is_found())
            .map(|(category, _)| category)
    }
}

/// The classifier's complete output for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub percentages: RiskPercentages,
    pub verdicts: RiskVerdicts,
}

impl RiskAssessment {
    /// `(vegetation_absence_pct, water_presence_pct, bare_soil_pct, verdicts)`
    pub fn into_parts(self) -> (Percentage, Percentage, Percentage, RiskVerdicts) {
        (
            self.percentages.vegetation_absence,
            self.percentages.water_presence,
            self.percentages.bare_soil,
            self.verdicts,
        )
    }
}

/// Classifies a decoded image of any colour type.
pub fn classify_risks(image: &DynamicImage) -> Result<RiskAssessment> {
    let rgb = image_source::to_rgb(image)?;
    classify_rgb(&rgb)
}

/// Classifies an image that is already 8-bit RGB.
pub fn classify_rgb(image: &RgbImage) -> Result<RiskAssessment> {
    image_source::ensure_not_empty(image.width(), image.height())?;

    let coverage = |predicate: ColorPredicate| -> Percentage {
        let mask = ColorMask::from_image(image, predicate);
        // Non-empty was checked above, so the mask always has a percentage.
        mask.percentage().unwrap_or_default()
    };

    let percentages = RiskPercentages {
        vegetation_absence: coverage(ColorPredicate::VegetationAbsence),
        water_presence: coverage(ColorPredicate::WaterPresence),
        bare_soil: coverage(ColorPredicate::BareSoil),
    };
    let verdicts = RiskVerdicts::from_percentages(&percentages);

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        vegetation_absence = percentages.vegetation_absence,
        water_presence = percentages.water_presence,
        bare_soil = percentages.bare_soil,
        "classified image"
    );

    Ok(RiskAssessment { percentages, verdicts })
}
