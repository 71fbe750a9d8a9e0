//! The core analysis loop.
//!
//! For every (strain, plate) group:
//!
//! 1. locate the negative-control well and derive the evaluation horizon
//! 2. compute per-replicate metrics for the control first (`metrics`)
//! 3. compute metrics for every other well, compare against the control
//!    baseline (`compare`), and classify (`classify`)
//!
//! Per-replicate and per-well numeric failures are carried as NaN/undefined
//! fields; only a missing or degenerate control well aborts the run.

pub mod classify;
pub mod compare;
pub mod metrics;

pub use classify::*;
pub use compare::*;
pub use metrics::*;

use std::collections::HashMap;

use crate::domain::{
    AnalysisConfig, GrowthCall, MetricKind, Observation, PlateGroup, Well, WellSeries,
};
use crate::error::AppError;

/// Fully analyzed well: metrics, comparisons, and the growth call.
#[derive(Debug, Clone)]
pub struct WellResult {
    pub strain: String,
    pub plate: String,
    pub well: Well,
    pub metabolite: Option<String>,
    /// Evaluation horizon (hours) shared by the whole (strain, plate) group.
    pub horizon: f64,
    /// Replicate IDs, sorted; all per-replicate vectors align with this.
    pub replicates: Vec<String>,
    pub final_od: MetricComparison,
    pub auc: MetricComparison,
    pub sgr: MetricComparison,
    /// Best R² achieved per replicate by the curve fitter.
    pub r2: Vec<f64>,
    pub call: GrowthCall,
}

impl WellResult {
    /// Comparison for one metric, in the fixed `MetricKind` order.
    pub fn comparison(&self, kind: MetricKind) -> &MetricComparison {
        match kind {
            MetricKind::FinalOd => &self.final_od,
            MetricKind::Auc => &self.auc,
            MetricKind::Sgr => &self.sgr,
        }
    }
}

/// Group raw observations into (strain, plate) plate groups.
///
/// Strains keep their first-appearance order; plates are sorted within each
/// strain; wells and replicates use their canonical orders via `BTreeMap`.
pub fn group_observations(observations: &[Observation]) -> Vec<PlateGroup> {
    let mut strain_order: Vec<String> = Vec::new();
    let mut by_key: HashMap<(String, String), PlateGroup> = HashMap::new();

    for obs in observations {
        if !strain_order.contains(&obs.strain) {
            strain_order.push(obs.strain.clone());
        }
        let key = (obs.strain.clone(), obs.plate.clone());
        let group = by_key.entry(key).or_insert_with(|| PlateGroup {
            strain: obs.strain.clone(),
            plate: obs.plate.clone(),
            wells: Default::default(),
        });
        let series = group.wells.entry(obs.well).or_insert_with(WellSeries::default);
        if series.metabolite.is_none() {
            series.metabolite = obs.metabolite.clone();
        }
        series
            .replicates
            .entry(obs.replicate.clone())
            .or_default()
            .push((obs.time_h, obs.od));
    }

    let mut groups: Vec<PlateGroup> = Vec::with_capacity(by_key.len());
    for strain in &strain_order {
        let mut plates: Vec<String> = by_key
            .keys()
            .filter(|(s, _)| s == strain)
            .map(|(_, p)| p.clone())
            .collect();
        plates.sort();
        for plate in plates {
            let mut group = by_key.remove(&(strain.clone(), plate)).expect("key present");
            for series in group.wells.values_mut() {
                for samples in series.replicates.values_mut() {
                    samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                }
            }
            groups.push(group);
        }
    }

    groups
}

/// Run the full metric/comparison/classification loop.
pub fn analyze(
    observations: &[Observation],
    config: &AnalysisConfig,
) -> Result<Vec<WellResult>, AppError> {
    let groups = group_observations(observations);
    if groups.is_empty() {
        return Err(AppError::data("No observations to analyze."));
    }

    let mut results = Vec::new();

    for group in &groups {
        let control_series = group.wells.get(&config.control_well).ok_or_else(|| {
            AppError::data(format!(
                "Missing negative-control well {} for strain '{}', plate '{}'.",
                config.control_well, group.strain, group.plate
            ))
        })?;

        let horizon = evaluation_horizon(control_series).ok_or_else(|| {
            AppError::data(format!(
                "Negative-control well {} has no timestamp common to all replicates \
                 (strain '{}', plate '{}').",
                config.control_well, group.strain, group.plate
            ))
        })?;

        // Control first: its per-replicate vectors are the comparison baseline
        // for every other well in the group.
        let control_metrics = compute_well_metrics(
            &group.strain,
            &group.plate,
            config.control_well,
            control_series,
            horizon,
            config,
        );

        for (&well, series) in &group.wells {
            let m = if well == config.control_well {
                control_metrics.clone()
            } else {
                compute_well_metrics(&group.strain, &group.plate, well, series, horizon, config)
            };

            let (final_od, auc, sgr) = if well == config.control_well {
                (
                    control_baseline(&m.final_od),
                    control_baseline(&m.auc),
                    control_baseline(&m.sgr),
                )
            } else {
                (
                    against_control(
                        &m.final_od,
                        &m.replicates,
                        &control_metrics.final_od,
                        &control_metrics.replicates,
                    ),
                    against_control(
                        &m.auc,
                        &m.replicates,
                        &control_metrics.auc,
                        &control_metrics.replicates,
                    ),
                    against_control(
                        &m.sgr,
                        &m.replicates,
                        &control_metrics.sgr,
                        &control_metrics.replicates,
                    ),
                )
            };

            let call = growth_call(&final_od, &auc, &sgr, config.fc_cutoff, config.pvalue_cutoff);

            results.push(WellResult {
                strain: group.strain.clone(),
                plate: group.plate.clone(),
                well,
                metabolite: series.metabolite.clone(),
                horizon,
                replicates: m.replicates,
                final_od,
                auc,
                sgr,
                r2: m.r2,
                call,
            });
        }
    }

    Ok(results)
}
