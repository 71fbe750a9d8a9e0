//! Export per-well results and the summary pivot to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. Per-replicate vectors are semicolon-joined inside one cell so the
//! file keeps one row per well.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::analysis::{MetricComparison, WellResult};
use crate::domain::MetricKind;
use crate::error::AppError;
use crate::report::{SummaryTable, NO_CALL};

/// Write the per-well results table.
pub fn write_results_csv(path: &Path, results: &[WellResult]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    let mut header = String::from("Strain,Plate,Well,Metabolite,LastCommonTime");
    for metric in MetricKind::ALL {
        let name = metric.display_name();
        header.push_str(&format!(",{name},{name}_Mean,{name}_MeanFC,{name}_Pvalue"));
    }
    header.push_str(",CurveFit_R2,GrowthStatus");
    writeln!(file, "{header}")
        .map_err(|e| AppError::config(format!("Failed to write export CSV header: {e}")))?;

    for r in results {
        let mut line = format!(
            "{},{},{},{},{}",
            csv_escape(&r.strain),
            csv_escape(&r.plate),
            r.well,
            csv_escape(r.metabolite.as_deref().unwrap_or("")),
            fmt_num(r.horizon),
        );
        for metric in MetricKind::ALL {
            line.push(',');
            line.push_str(&metric_cells(r.comparison(metric)));
        }
        writeln!(file, "{line},{},{}", join_nums(&r.r2), r.call)
            .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the cross-strain summary pivot.
pub fn write_summary_csv(path: &Path, table: &SummaryTable) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create summary CSV '{}': {e}", path.display()))
    })?;

    let mut header = String::from("Plate,Metabolite");
    for strain in &table.strains {
        header.push(',');
        header.push_str(&csv_escape(strain));
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::config(format!("Failed to write summary CSV header: {e}")))?;

    for row in &table.rows {
        let mut line = format!("{},{}", csv_escape(&row.plate), csv_escape(&row.metabolite));
        for call in &row.calls {
            line.push(',');
            match call {
                Some(c) => line.push_str(&c.to_string()),
                None => line.push_str(NO_CALL),
            }
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::config(format!("Failed to write summary CSV row: {e}")))?;
    }

    Ok(())
}

fn metric_cells(c: &MetricComparison) -> String {
    format!(
        "{},{},{},{}",
        join_nums(&c.values),
        fmt_num(c.mean),
        fmt_num(c.mean_fold_change),
        c.p_value.map(fmt_num).unwrap_or_default(),
    )
}

fn join_nums(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|&v| fmt_num(v)).collect();
    parts.join(";")
}

fn fmt_num(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        String::new()
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::control_baseline;
    use crate::domain::GrowthCall;
    use std::path::PathBuf;

    fn result_row(strain: &str, plate: &str, metabolite: &str) -> WellResult {
        let comparison = control_baseline(&[1.0]);
        WellResult {
            strain: strain.to_string(),
            plate: plate.to_string(),
            well: "A2".parse().unwrap(),
            metabolite: Some(metabolite.to_string()),
            horizon: 24.0,
            replicates: vec!["r1".to_string()],
            final_od: comparison.clone(),
            auc: comparison.clone(),
            sgr: comparison,
            r2: vec![1.0],
            call: GrowthCall::NEGATIVE,
        }
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("biolog-export-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("out.csv")
    }

    #[test]
    fn strain_and_plate_fields_are_escaped_in_rows() {
        let path = scratch_file("escape");
        let results = vec![result_row("E. coli, K-12", "PM\"1\"", "D-Glucose")];
        write_results_csv(&path, &results).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header_cols = text.lines().next().unwrap().split(',').count();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("\"E. coli, K-12\",\"PM\"\"1\"\"\",A2,D-Glucose"));

        // Quoting keeps the embedded comma out of the column count.
        let unquoted_commas = {
            let mut in_quotes = false;
            row.chars()
                .filter(|&c| {
                    if c == '"' {
                        in_quotes = !in_quotes;
                    }
                    c == ',' && !in_quotes
                })
                .count()
        };
        assert_eq!(unquoted_commas + 1, header_cols);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn joined_vectors_leave_undefined_entries_empty() {
        assert_eq!(join_nums(&[0.5, f64::NAN, 1.25]), "0.5;;1.25");
    }

    #[test]
    fn metric_cells_layout_is_values_mean_fc_p() {
        let c = MetricComparison {
            values: vec![1.0, 2.0],
            mean: 1.5,
            mean_fold_change: 2.0,
            p_value: Some(0.01),
        };
        assert_eq!(metric_cells(&c), "1;2,1.5,2,0.01");
    }

    #[test]
    fn commas_in_metabolite_names_are_quoted() {
        assert_eq!(csv_escape("2,3-Butanediol"), "\"2,3-Butanediol\"");
        assert_eq!(csv_escape("D-Glucose"), "D-Glucose");
    }
}
