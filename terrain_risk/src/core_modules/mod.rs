pub mod brightness_histogram;
pub mod color_mask;
pub mod image_source;
pub mod pixel;
pub mod risk_classifier;
