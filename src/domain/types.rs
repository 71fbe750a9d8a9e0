//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during analysis
//! - exported to CSV
//! - reloaded later for comparisons across runs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sigmoid growth model used for the specific-growth-rate fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GrowthModelKind {
    Logistic,
    Gompertz,
}

impl GrowthModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            GrowthModelKind::Logistic => "Logistic",
            GrowthModelKind::Gompertz => "Gompertz",
        }
    }
}

/// Structured plate well coordinate, e.g. `A1` or `B10`.
///
/// The derived ordering (row letter ascending, then column number ascending)
/// is the canonical processing order for wells on a plate. Parsing the column
/// as a number avoids the `A10 < A2` trap of lexicographic well-ID sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Well {
    /// Row letter (`b'A'..=b'Z'`).
    pub row: u8,
    /// Column number (1-based).
    pub col: u8,
}

impl FromStr for Well {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.bytes();
        let row = chars
            .next()
            .filter(u8::is_ascii_alphabetic)
            .map(|b| b.to_ascii_uppercase())
            .ok_or_else(|| format!("Invalid well ID '{s}': expected a row letter."))?;
        let col_str = &s[1..];
        let col: u8 = col_str
            .parse()
            .map_err(|_| format!("Invalid well ID '{s}': expected a column number."))?;
        if col == 0 {
            return Err(format!("Invalid well ID '{s}': column numbers start at 1."));
        }
        Ok(Well { row, col })
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row as char, self.col)
    }
}

/// A single plate-reader measurement.
///
/// Produced by ingest (or the synthetic generator); immutable thereafter.
#[derive(Debug, Clone)]
pub struct Observation {
    pub strain: String,
    pub plate: String,
    pub replicate: String,
    pub well: Well,
    pub metabolite: Option<String>,
    /// Time since inoculation, in hours.
    pub time_h: f64,
    /// Optical density reading.
    pub od: f64,
}

/// One well's observations, keyed by replicate, each time-ordered.
#[derive(Debug, Clone, Default)]
pub struct WellSeries {
    pub metabolite: Option<String>,
    /// Replicate ID -> `(time_h, od)` samples sorted by time.
    pub replicates: BTreeMap<String, Vec<(f64, f64)>>,
}

/// All wells of one (strain, plate) combination.
#[derive(Debug, Clone)]
pub struct PlateGroup {
    pub strain: String,
    pub plate: String,
    /// Wells in canonical plate order.
    pub wells: BTreeMap<Well, WellSeries>,
}

/// Fitted growth-model parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Maximum growth (asymptote) on the log-relative scale.
    pub a: f64,
    /// Lag time in hours.
    pub lag: f64,
    /// Maximum specific growth rate.
    pub mu: f64,
}

impl GrowthParams {
    /// Undefined-marker triple used for failed fits.
    pub fn undefined() -> Self {
        Self {
            a: f64::NAN,
            lag: f64::NAN,
            mu: f64::NAN,
        }
    }
}

/// Result of a single fit attempt.
#[derive(Debug, Clone, Copy)]
pub struct FitOutcome {
    pub converged: bool,
    pub params: GrowthParams,
    pub r2: f64,
}

impl FitOutcome {
    pub fn failed() -> Self {
        Self {
            converged: false,
            params: GrowthParams::undefined(),
            r2: f64::NAN,
        }
    }
}

/// The three growth metrics, in the fixed order used by `GrowthCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    FinalOd,
    Auc,
    Sgr,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::FinalOd, MetricKind::Auc, MetricKind::Sgr];

    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::FinalOd => "FinalOD",
            MetricKind::Auc => "AUC",
            MetricKind::Sgr => "SGR",
        }
    }
}

/// Three-character growth call, one flag per metric (FinalOD, AUC, SGR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrowthCall {
    pub final_od: bool,
    pub auc: bool,
    pub sgr: bool,
}

impl GrowthCall {
    /// Fully negative call (`---`).
    pub const NEGATIVE: GrowthCall = GrowthCall {
        final_od: false,
        auc: false,
        sgr: false,
    };

    /// Number of `+` characters; the summary pivot prefers higher counts.
    pub fn plus_count(self) -> usize {
        usize::from(self.final_od) + usize::from(self.auc) + usize::from(self.sgr)
    }

    pub fn is_negative(self) -> bool {
        self.plus_count() == 0
    }
}

impl fmt::Display for GrowthCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in [self.final_od, self.auc, self.sgr] {
            f.write_str(if flag { "+" } else { "-" })?;
        }
        Ok(())
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults) and validated once before
/// any processing begins.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub model: GrowthModelKind,
    /// Minimum R² a fit must reach before the retry loop stops early.
    pub min_r2: f64,
    /// Maximum number of randomized initial guesses per replicate.
    pub max_trials: usize,
    /// Minimum mean fold-change for a positive growth phenotype.
    pub fc_cutoff: f64,
    /// Maximum p-value for a positive growth phenotype.
    pub pvalue_cutoff: f64,
    /// Negative-control well (conventionally A1).
    pub control_well: Well,
    /// Root seed for the randomized initial guesses.
    pub seed: u64,
    /// Optional directory of per-plate `<plate>_info.csv` well->metabolite maps.
    pub plate_info_dir: Option<PathBuf>,
    /// Output file prefix; `None` means derive one from the current timestamp.
    pub out_prefix: Option<PathBuf>,
    /// Skip CSV exports entirely (terminal summary only).
    pub no_export: bool,
}

impl AnalysisConfig {
    /// Validate cutoff ranges at the boundary, before processing begins.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&self.min_r2) {
            return Err(AppError::config(format!(
                "--min-r2 must be in [0, 1], got {}.",
                self.min_r2
            )));
        }
        if !(1..=10_000).contains(&self.max_trials) {
            return Err(AppError::config(format!(
                "--max-trials must be in [1, 10000], got {}.",
                self.max_trials
            )));
        }
        if !(self.fc_cutoff.is_finite() && self.fc_cutoff >= 1.0) {
            return Err(AppError::config(format!(
                "--fc-cutoff must be >= 1.0, got {}.",
                self.fc_cutoff
            )));
        }
        if !(0.0..=1.0).contains(&self.pvalue_cutoff) {
            return Err(AppError::config(format!(
                "--pvalue-cutoff must be in [0, 1], got {}.",
                self.pvalue_cutoff
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_parses_and_prints_round_trip() {
        let w: Well = "B10".parse().unwrap();
        assert_eq!(w, Well { row: b'B', col: 10 });
        assert_eq!(w.to_string(), "B10");

        let lower: Well = "a1".parse().unwrap();
        assert_eq!(lower.to_string(), "A1");
    }

    #[test]
    fn well_rejects_garbage() {
        assert!("".parse::<Well>().is_err());
        assert!("11".parse::<Well>().is_err());
        assert!("A".parse::<Well>().is_err());
        assert!("A0".parse::<Well>().is_err());
        assert!("AX".parse::<Well>().is_err());
    }

    #[test]
    fn well_order_is_numeric_not_lexicographic() {
        let mut wells: Vec<Well> = ["A10", "B1", "A2", "A1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        wells.sort();
        let ids: Vec<String> = wells.iter().map(Well::to_string).collect();
        assert_eq!(ids, ["A1", "A2", "A10", "B1"]);
    }

    #[test]
    fn growth_call_display_and_plus_count() {
        let call = GrowthCall {
            final_od: true,
            auc: false,
            sgr: true,
        };
        assert_eq!(call.to_string(), "+-+");
        assert_eq!(call.plus_count(), 2);
        assert_eq!(GrowthCall::NEGATIVE.to_string(), "---");
        assert!(GrowthCall::NEGATIVE.is_negative());
    }

    fn base_config() -> AnalysisConfig {
        AnalysisConfig {
            model: GrowthModelKind::Logistic,
            min_r2: 0.9,
            max_trials: 50,
            fc_cutoff: 1.2,
            pvalue_cutoff: 0.05,
            control_well: "A1".parse().unwrap(),
            seed: 42,
            plate_info_dir: None,
            out_prefix: None,
            no_export: true,
        }
    }

    #[test]
    fn config_rejects_out_of_range_cutoffs() {
        assert!(base_config().validate().is_ok());

        let mut bad = base_config();
        bad.min_r2 = 1.5;
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);

        let mut bad = base_config();
        bad.max_trials = 0;
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);

        let mut bad = base_config();
        bad.fc_cutoff = 0.8;
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);

        let mut bad = base_config();
        bad.pvalue_cutoff = -0.1;
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);
    }
}
