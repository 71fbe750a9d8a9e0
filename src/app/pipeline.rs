//! Shared analysis pipeline used by both the `run` and `demo` front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> plate annotation -> group/fit/compare/classify -> summary pivot
//!
//! The front-ends then focus on presentation (printing and exports).

use std::path::Path;

use crate::analysis::{analyze, WellResult};
use crate::data::{generate_sample, SampleSpec};
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::io::ingest::{load_observations, IngestedData};
use crate::io::plate::apply_plate_info;
use crate::report::{summarize, SummaryTable};

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub results: Vec<WellResult>,
    pub summary: SummaryTable,
}

/// Execute the full pipeline on a readings file.
pub fn run_analysis(input: &Path, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    config.validate()?;

    let mut ingest = load_observations(input)?;
    if let Some(dir) = &config.plate_info_dir {
        apply_plate_info(&mut ingest.observations, dir)?;
    }

    run_with_observations(ingest, config)
}

/// Execute the pipeline on a synthetic plate.
pub fn run_demo(spec: &SampleSpec, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    config.validate()?;

    let observations = generate_sample(spec)?;
    run_with_observations(IngestedData::from_observations(observations), config)
}

/// Analyze pre-ingested observations (shared tail of both entry points).
pub fn run_with_observations(
    ingest: IngestedData,
    config: &AnalysisConfig,
) -> Result<RunOutput, AppError> {
    let results = analyze(&ingest.observations, config)?;
    let summary = summarize(&results);

    Ok(RunOutput {
        ingest,
        results,
        summary,
    })
}
