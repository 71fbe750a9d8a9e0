//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - structured well coordinates (`Well`) with the canonical plate order
//! - raw plate-reader observations (`Observation`) and grouped series
//! - fit outputs (`GrowthParams`, `FitOutcome`)
//! - run configuration (`AnalysisConfig`) derived from CLI flags

pub mod types;

pub use types::*;
