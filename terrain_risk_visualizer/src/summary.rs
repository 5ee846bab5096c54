use serde::{Deserialize, Serialize};
use terrain_risk::pipeline::AnalysisReport;

/// Serializable view of an `AnalysisReport`, shared by the JSON API, the HTML
/// pages and the command line tester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub width: u32,
    pub height: u32,
    pub percentages: PercentageSummary,
    pub verdicts: Vec<VerdictSummary>,
    pub risk_detected: bool,
    /// Average gray intensity, 0..=255.
    pub mean_brightness: Option<f64>,
    /// Most populated gray intensity.
    pub peak_brightness: Option<u8>,
    pub histogram: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageSummary {
    pub vegetation_absence: f64,
    pub water_presence: f64,
    pub bare_soil: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictSummary {
    pub label: String,
    pub verdict: String,
    pub found: bool,
}

impl From<&AnalysisReport> for AnalysisSummary {
    fn from(report: &AnalysisReport) -> Self {
        let percentages = report.percentages();
        Self {
            width: report.width,
            height: report.height,
            percentages: PercentageSummary {
                vegetation_absence: percentages.vegetation_absence,
                water_presence: percentages.water_presence,
                bare_soil: percentages.bare_soil,
            },
            verdicts: report
                .verdicts()
                .iter()
                .map(|(category, verdict)| VerdictSummary {
                    label: category.label().to_string(),
                    verdict: verdict.as_str().to_string(),
                    found: verdict.is_found(),
                })
                .collect(),
            risk_detected: report.risk_detected(),
            mean_brightness: report.histogram.mean(),
            peak_brightness: report.histogram.peak(),
            histogram: report.histogram.to_vec(),
        }
    }
}
