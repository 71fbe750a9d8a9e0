//! Reporting: the cross-strain summary pivot and formatted terminal output.

pub mod format;

pub use format::{format_run_summary, format_summary_table};

use std::collections::HashMap;

use crate::analysis::WellResult;
use crate::domain::{GrowthCall, Well};

/// One pivot row: a (plate, metabolite) pair with one call per strain.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub plate: String,
    pub metabolite: String,
    /// Calls aligned with `SummaryTable::strains`; `None` where the strain
    /// has no data for this (plate, metabolite).
    pub calls: Vec<Option<GrowthCall>>,
}

/// Cross-strain summary: (plate, metabolite) rows by strain columns.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    /// Strain column order (sorted).
    pub strains: Vec<String>,
    /// Rows ordered by plate, then by the first well carrying the metabolite.
    pub rows: Vec<SummaryRow>,
}

/// Placeholder printed for a missing or fully negative call.
pub const NO_CALL: &str = "---";

/// Build the cross-strain pivot from per-well results.
///
/// When several wells of one plate share a metabolite, the call with the most
/// positive metrics wins; ties keep the earlier well. Rows that are negative
/// or absent for every strain are dropped.
pub fn summarize(results: &[WellResult]) -> SummaryTable {
    let mut strains: Vec<String> = Vec::new();
    for r in results {
        if !strains.contains(&r.strain) {
            strains.push(r.strain.clone());
        }
    }
    strains.sort();

    // Row order: plate, then first well seen for the metabolite.
    let mut row_order: Vec<(String, String)> = Vec::new();
    let mut first_well: HashMap<(String, String), Well> = HashMap::new();
    let mut cells: HashMap<(String, String, String), GrowthCall> = HashMap::new();

    for r in results {
        let metabolite = r
            .metabolite
            .clone()
            .unwrap_or_else(|| r.well.to_string());
        let row_key = (r.plate.clone(), metabolite.clone());
        if !first_well.contains_key(&row_key) {
            first_well.insert(row_key.clone(), r.well);
            row_order.push(row_key);
        }

        let cell_key = (r.plate.clone(), metabolite, r.strain.clone());
        match cells.get(&cell_key) {
            Some(existing) if existing.plus_count() >= r.call.plus_count() => {}
            _ => {
                cells.insert(cell_key, r.call);
            }
        }
    }

    row_order.sort_by(|a, b| {
        (a.0.as_str(), first_well[a]).cmp(&(b.0.as_str(), first_well[b]))
    });

    let mut rows = Vec::new();
    for (plate, metabolite) in row_order {
        let calls: Vec<Option<GrowthCall>> = strains
            .iter()
            .map(|s| cells.get(&(plate.clone(), metabolite.clone(), s.clone())).copied())
            .collect();

        let all_negative = calls
            .iter()
            .all(|c| c.map(|call| call.is_negative()).unwrap_or(true));
        if all_negative {
            continue;
        }

        rows.push(SummaryRow {
            plate,
            metabolite,
            calls,
        });
    }

    SummaryTable { strains, rows }
}
