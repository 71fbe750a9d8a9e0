//! Per-plate metabolite maps.
//!
//! A plate info file named `<plate>_info.csv` maps well coordinates to the
//! metabolite in that well. When a plate info directory is given, every plate
//! in the readings must have a map; a missing file is a configuration error.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Observation, Well};
use crate::error::AppError;

/// Load the well-to-metabolite map for one plate.
pub fn load_plate_map(dir: &Path, plate: &str) -> Result<HashMap<Well, String>, AppError> {
    let path = dir.join(format!("{plate}_info.csv"));
    let file = File::open(&path).map_err(|e| {
        AppError::config(format!(
            "Missing plate info file for plate '{plate}': '{}': {e}",
            path.display()
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read plate info headers: {e}")))?
        .clone();
    let well_idx = find_column(&headers, "well").ok_or_else(|| {
        AppError::config(format!("Plate info '{}' has no `well` column.", path.display()))
    })?;
    let metab_idx = find_column(&headers, "metabolite").ok_or_else(|| {
        AppError::config(format!(
            "Plate info '{}' has no `metabolite` column.",
            path.display()
        ))
    })?;

    let mut map = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::config(format!("Plate info '{}' line {line}: {e}", path.display()))
        })?;
        let well: Well = field(&record, well_idx).parse().map_err(|e| {
            AppError::config(format!("Plate info '{}' line {line}: {e}", path.display()))
        })?;
        let metabolite = field(&record, metab_idx).to_string();
        if metabolite.is_empty() {
            continue;
        }
        map.insert(well, metabolite);
    }

    Ok(map)
}

/// Overwrite observation metabolites from the per-plate info files.
pub fn apply_plate_info(observations: &mut [Observation], dir: &Path) -> Result<(), AppError> {
    let plates: BTreeSet<String> = observations.iter().map(|o| o.plate.clone()).collect();

    let mut maps: HashMap<String, HashMap<Well, String>> = HashMap::new();
    for plate in plates {
        let map = load_plate_map(dir, &plate)?;
        maps.insert(plate, map);
    }

    for obs in observations.iter_mut() {
        if let Some(name) = maps.get(&obs.plate).and_then(|m| m.get(&obs.well)) {
            obs.metabolite = Some(name.clone());
        }
    }

    Ok(())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| {
        h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name)
    })
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).map(str::trim).unwrap_or("")
}
