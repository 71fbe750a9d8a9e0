//! CSV ingest and normalization.
//!
//! Turns a long-format plate-reader export into clean `Observation`s that are
//! safe to group and fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no grouping or fitting logic here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Observation, Well};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 6] = ["strain", "plate", "replicate", "well", "time", "od"];

/// Summary stats about the observations actually kept.
#[derive(Debug, Clone)]
pub struct IngestStats {
    pub n_rows: usize,
    pub n_skipped: usize,
    pub n_strains: usize,
    pub n_plates: usize,
    pub time_min: f64,
    pub time_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized observations + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub stats: IngestStats,
    pub row_errors: Vec<RowError>,
}

impl IngestedData {
    /// Wrap already-validated observations (synthetic data path).
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let stats = compute_stats(&observations, 0);
        Self {
            observations,
            stats,
            row_errors: Vec::new(),
        }
    }
}

/// Load and normalize a long-format readings CSV.
pub fn load_observations(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    ingest_from_reader(file)
}

/// Ingest from any reader (used directly by tests).
pub fn ingest_from_reader<R: Read>(reader: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::config(format!("Missing required column: `{name}`")));
        }
    }

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if observations.is_empty() {
        return Err(AppError::data("No valid rows remain after validation."));
    }

    let stats = compute_stats(&observations, row_errors.len());

    Ok(IngestedData {
        observations,
        stats,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿strain"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Observation, String> {
    let strain = get_required(record, header_map, "strain")?.to_string();
    let plate = get_required(record, header_map, "plate")?.to_string();
    let replicate = get_required(record, header_map, "replicate")?.to_string();

    let well: Well = get_required(record, header_map, "well")?.parse()?;

    let time_h = parse_f64(get_required(record, header_map, "time")?, "time")?;
    if time_h < 0.0 {
        return Err("Negative `time` value.".to_string());
    }
    let od = parse_f64(get_required(record, header_map, "od")?, "od")?;
    if od <= 0.0 {
        return Err("Non-positive `od` value.".to_string());
    }

    let metabolite = get_optional(record, header_map, "metabolite").map(str::to_string);

    Ok(Observation {
        strain,
        plate,
        replicate,
        well,
        metabolite,
        time_h,
        od,
    })
}

fn compute_stats(observations: &[Observation], n_skipped: usize) -> IngestStats {
    let mut strains = HashSet::new();
    let mut plates = HashSet::new();
    let mut time_min = f64::INFINITY;
    let mut time_max = f64::NEG_INFINITY;

    for obs in observations {
        strains.insert(obs.strain.as_str());
        plates.insert((obs.strain.as_str(), obs.plate.as_str()));
        time_min = time_min.min(obs.time_h);
        time_max = time_max.max(obs.time_h);
    }

    IngestStats {
        n_rows: observations.len(),
        n_skipped,
        n_strains: strains.len(),
        n_plates: plates.len(),
        time_min,
        time_max,
    }
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}
