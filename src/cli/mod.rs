//! Command-line parsing for the plate-reader growth pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the analysis/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{GrowthModelKind, Well};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "biolog", version, about = "Growth phenotype calls from plate-reader kinetics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a long-format readings CSV and print/export growth calls.
    Run(RunArgs),
    /// Analyze a seeded synthetic plate (no input file needed).
    Demo(DemoArgs),
}

/// Options shared by every analysis run.
#[derive(Debug, Parser, Clone)]
pub struct AnalysisArgs {
    /// Growth model fitted to ln(OD/OD0).
    #[arg(long, value_enum, default_value_t = GrowthModelKind::Logistic)]
    pub growth_model: GrowthModelKind,

    /// Minimum R² before the per-replicate retry loop stops early.
    #[arg(long, default_value_t = 0.90)]
    pub min_r2: f64,

    /// Maximum randomized initial guesses per replicate.
    #[arg(long, default_value_t = 50)]
    pub max_trials: usize,

    /// Minimum mean fold-change vs control for a positive call.
    #[arg(long, default_value_t = 1.2)]
    pub fc_cutoff: f64,

    /// Maximum p-value vs control for a positive call.
    #[arg(long, default_value_t = 0.05)]
    pub pvalue_cutoff: f64,

    /// Negative-control well coordinate.
    #[arg(long, default_value = "A1")]
    pub control_well: Well,

    /// Root seed for randomized initial guesses.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output file prefix (default: biolog_<timestamp>).
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Skip CSV exports (terminal summary only).
    #[arg(long)]
    pub no_export: bool,
}

/// Options for analyzing a readings file.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Long-format readings CSV (strain,plate,replicate,well,time,od).
    pub input: PathBuf,

    /// Directory of per-plate `<plate>_info.csv` well-to-metabolite maps.
    #[arg(long = "plate-info")]
    pub plate_info: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Options for the synthetic demo run.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Strain names for the synthetic plate.
    #[arg(long, value_delimiter = ',', default_values_t = vec!["K12".to_string(), "B-REL606".to_string()])]
    pub strains: Vec<String>,

    /// Replicates per strain.
    #[arg(long, default_value_t = 3)]
    pub replicates: usize,

    /// Hourly readings after t=0.
    #[arg(long, default_value_t = 24)]
    pub hours: usize,

    /// Lognormal noise sigma on every reading.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_match_the_documented_settings() {
        let cli = Cli::parse_from(["biolog", "run", "readings.csv"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.analysis.growth_model, GrowthModelKind::Logistic);
        assert_eq!(args.analysis.min_r2, 0.90);
        assert_eq!(args.analysis.max_trials, 50);
        assert_eq!(args.analysis.fc_cutoff, 1.2);
        assert_eq!(args.analysis.pvalue_cutoff, 0.05);
        assert_eq!(args.analysis.control_well.to_string(), "A1");
        assert_eq!(args.analysis.seed, 42);
        assert!(!args.analysis.no_export);
    }

    #[test]
    fn control_well_flag_is_parsed_and_validated() {
        let cli = Cli::parse_from(["biolog", "run", "r.csv", "--control-well", "h12"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.analysis.control_well.to_string(), "H12");

        assert!(Cli::try_parse_from(["biolog", "run", "r.csv", "--control-well", "Z0"]).is_err());
    }

    #[test]
    fn demo_strains_split_on_commas() {
        let cli = Cli::parse_from(["biolog", "demo", "--strains", "S1,S2,S3"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.strains, ["S1", "S2", "S3"]);
    }
}
