//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads readings (or generates the synthetic demo plate)
//! - runs the metric/comparison/classification pipeline
//! - prints the run summary and cross-strain pivot
//! - writes optional CSV exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{AnalysisArgs, Command, DemoArgs, RunArgs};
use crate::data::SampleSpec;
use crate::domain::AnalysisConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `biolog` binary.
pub fn run() -> Result<(), AppError> {
    // `biolog readings.csv` should behave like `biolog run readings.csv`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis, args.plate_info.clone());
    let run = pipeline::run_analysis(&args.input, &config)?;
    present(&run, &config)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis, None);
    let spec = SampleSpec {
        strains: args.strains.clone(),
        replicates: args.replicates,
        hours: args.hours,
        model: config.model,
        noise_sd: args.noise,
        seed: config.seed,
    };
    let run = pipeline::run_demo(&spec, &config)?;
    present(&run, &config)
}

fn present(run: &pipeline::RunOutput, config: &AnalysisConfig) -> Result<(), AppError> {
    for err in run.ingest.row_errors.iter().take(20) {
        eprintln!("warning: line {}: {}", err.line, err.message);
    }
    if run.ingest.row_errors.len() > 20 {
        eprintln!(
            "warning: {} more rows skipped",
            run.ingest.row_errors.len() - 20
        );
    }

    print!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.results, config)
    );
    print!("{}", crate::report::format_summary_table(&run.summary));

    if !config.no_export {
        let prefix = resolve_out_prefix(config);
        let all_path = PathBuf::from(format!("{}_all.csv", prefix.display()));
        let summary_path = PathBuf::from(format!("{}_summary.csv", prefix.display()));

        crate::io::export::write_results_csv(&all_path, &run.results)?;
        crate::io::export::write_summary_csv(&summary_path, &run.summary)?;

        println!();
        println!("Wrote {} and {}", all_path.display(), summary_path.display());
    }

    Ok(())
}

fn resolve_out_prefix(config: &AnalysisConfig) -> PathBuf {
    match &config.out_prefix {
        Some(prefix) => prefix.clone(),
        None => {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(format!("biolog_{stamp}"))
        }
    }
}

pub fn analysis_config_from_args(args: &AnalysisArgs, plate_info_dir: Option<PathBuf>) -> AnalysisConfig {
    AnalysisConfig {
        model: args.growth_model,
        min_r2: args.min_r2,
        max_trials: args.max_trials,
        fc_cutoff: args.fc_cutoff,
        pvalue_cutoff: args.pvalue_cutoff,
        control_well: args.control_well,
        seed: args.seed,
        plate_info_dir,
        out_prefix: args.out.clone(),
        no_export: args.no_export,
    }
}

/// Rewrite argv so `biolog readings.csv` defaults to `biolog run readings.csv`.
///
/// Rules:
/// - `biolog`                      -> unchanged (clap prints the help)
/// - `biolog data.csv ...`         -> `biolog run data.csv ...`
/// - `biolog --help/--version/-h`  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "demo");
    if is_subcommand {
        return argv;
    }

    // A bare path (or a flag) as the first token means "run".
    argv.insert(1, "run".to_string());
    argv
}
