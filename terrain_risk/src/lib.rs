// THEORY:
// This file is the main entry point for the `terrain_risk` library crate.
// It exposes the environmental-risk engine to external consumers (the command
// line tester and the web visualizer).
//
// The engine answers two questions about a single decoded photograph:
// - which share of it looks like vegetation, water and bare soil, and which
//   risks (drought, flood, land degradation) those shares imply; and
// - how its brightness is distributed across the 256 grayscale levels.
//
// `pipeline` is the clean, high-level interface. The `core_modules` hold the
// individual analysers, and `parallel_pipeline` spreads separate images over a
// worker pool. Acquiring bytes, persisting uploads and drawing charts are the
// caller's business and never enter this crate.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::brightness_histogram::build_histogram;
pub use core_modules::risk_classifier::classify_risks;
pub use error::InvalidImageError;
pub use pipeline::{AnalysisReport, analyze_image};
