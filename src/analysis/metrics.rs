//! Per-well metric computation.
//!
//! For every replicate of a well (truncated to the group's evaluation
//! horizon) we compute three scalars:
//!
//! - **FinalOD** - the OD reading at the horizon timestamp
//! - **AUC** - composite Simpson integration of OD over time
//! - **SGR** - `mu` of the best growth-model fit on `ln(od/od[0])`
//!
//! All values are rounded to 3 decimal places before any comparison, so the
//! report and the statistics agree.
//!
//! Replicate fits run in parallel; each replicate draws its random initial
//! guesses from its own generator, seeded from the root seed and the
//! (strain, plate, well, replicate) identity, so results are bit-for-bit
//! reproducible regardless of scheduling.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::domain::{AnalysisConfig, Well, WellSeries};
use crate::fit::fit_with_retries;
use crate::math::{round_to, simpson};

/// Per-replicate metric vectors for one well, aligned with `replicates`.
#[derive(Debug, Clone)]
pub struct WellMetrics {
    /// Replicate IDs in sorted order.
    pub replicates: Vec<String>,
    pub final_od: Vec<f64>,
    pub auc: Vec<f64>,
    pub sgr: Vec<f64>,
    /// Best R² achieved per replicate (0.0 when no attempt converged).
    pub r2: Vec<f64>,
}

/// Evaluation horizon for a (strain, plate) group.
///
/// Among the control well's timestamps, find those observed in *every*
/// replicate of that well and return the latest. `None` when the well is
/// empty or no timestamp is shared by all replicates.
pub fn evaluation_horizon(control: &WellSeries) -> Option<f64> {
    let n_reps = control.replicates.len();
    if n_reps == 0 {
        return None;
    }

    // Count distinct replicates per exact timestamp (bit pattern as key).
    let mut seen: HashMap<u64, (f64, Vec<&str>)> = HashMap::new();
    for (rep, samples) in &control.replicates {
        for &(t, _) in samples {
            let entry = seen.entry(t.to_bits()).or_insert((t, Vec::new()));
            if !entry.1.iter().any(|r| *r == rep.as_str()) {
                entry.1.push(rep);
            }
        }
    }

    seen.values()
        .filter(|(_, reps)| reps.len() == n_reps)
        .map(|(t, _)| *t)
        .fold(None, |acc, t| match acc {
            Some(best) if best >= t => Some(best),
            _ => Some(t),
        })
}

/// Compute the three metric vectors for one well.
pub fn compute_well_metrics(
    strain: &str,
    plate: &str,
    well: Well,
    series: &WellSeries,
    horizon: f64,
    config: &AnalysisConfig,
) -> WellMetrics {
    // Truncate each replicate to the horizon; keep sorted order.
    let truncated: Vec<(String, Vec<f64>, Vec<f64>)> = series
        .replicates
        .iter()
        .map(|(rep, samples)| {
            let mut xs = Vec::with_capacity(samples.len());
            let mut ods = Vec::with_capacity(samples.len());
            for &(t, od) in samples.iter().filter(|(t, _)| *t <= horizon) {
                xs.push(t);
                ods.push(od);
            }
            (rep.clone(), xs, ods)
        })
        .collect();

    let replicates: Vec<String> = truncated.iter().map(|(rep, _, _)| rep.clone()).collect();

    let final_od: Vec<f64> = truncated
        .iter()
        .map(|(_, xs, ods)| {
            xs.iter()
                .position(|&t| t == horizon)
                .map(|i| round_to(ods[i], 3))
                .unwrap_or(f64::NAN)
        })
        .collect();

    let auc: Vec<f64> = truncated
        .iter()
        .map(|(_, xs, ods)| round_to(simpson(xs, ods), 3))
        .collect();

    // The expensive part: one randomized retry loop per replicate.
    let fits: Vec<(f64, f64)> = truncated
        .par_iter()
        .map(|(rep, xs, ods)| {
            let seed = replicate_seed(config.seed, strain, plate, well, rep);
            let mut rng = StdRng::seed_from_u64(seed);

            if ods.is_empty() {
                return (f64::NAN, 0.0);
            }
            let od0 = ods[0];
            let log_rel: Vec<f64> = ods.iter().map(|&od| (od / od0).ln()).collect();

            let res = fit_with_retries(
                xs,
                &log_rel,
                config.model,
                config.min_r2,
                config.max_trials,
                &mut rng,
            );
            (round_to(res.sgr, 3), round_to(res.best_r2, 3))
        })
        .collect();

    let (sgr, r2): (Vec<f64>, Vec<f64>) = fits.into_iter().unzip();

    WellMetrics {
        replicates,
        final_od,
        auc,
        sgr,
        r2,
    }
}

/// Deterministic per-replicate seed derived from the run's root seed and the
/// replicate identity, so parallel scheduling cannot change results.
fn replicate_seed(base: u64, strain: &str, plate: &str, well: Well, replicate: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    strain.hash(&mut hasher);
    plate.hash(&mut hasher);
    well.hash(&mut hasher);
    replicate.hash(&mut hasher);
    hasher.finish()
}
