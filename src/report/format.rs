//! Formatted terminal output.
//!
//! Formatting lives in one place so the analysis code stays clean and output
//! changes are localized.

use crate::analysis::WellResult;
use crate::domain::AnalysisConfig;
use crate::io::ingest::IngestedData;
use crate::report::{SummaryTable, NO_CALL};

/// Format the full run summary (dataset stats + settings + call counts).
pub fn format_run_summary(
    ingest: &IngestedData,
    results: &[WellResult],
    config: &AnalysisConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== biolog - Growth Phenotype Calls ===\n");
    out.push_str(&format!("Model: {}\n", config.model.display_name()));
    out.push_str(&format!(
        "Cutoffs: fold-change>={} | p<{} | min R2={}\n",
        config.fc_cutoff, config.pvalue_cutoff, config.min_r2
    ));
    out.push_str(&format!(
        "Control well: {} | seed: {}\n",
        config.control_well, config.seed
    ));

    out.push_str(&format!(
        "Input: {} rows ({} skipped) | {} strains | {} plates | t=[{:.2}, {:.2}]h\n",
        ingest.stats.n_rows,
        ingest.stats.n_skipped,
        ingest.stats.n_strains,
        ingest.stats.n_plates,
        ingest.stats.time_min,
        ingest.stats.time_max,
    ));

    let positive = results.iter().filter(|r| !r.call.is_negative()).count();
    out.push_str(&format!(
        "Wells analyzed: {} | with at least one positive metric: {}\n",
        results.len(),
        positive
    ));
    out.push('\n');

    out
}

/// Format the cross-strain summary pivot as a fixed-width table.
pub fn format_summary_table(table: &SummaryTable) -> String {
    let mut out = String::new();

    if table.rows.is_empty() {
        out.push_str("No positive growth calls.\n");
        return out;
    }

    let metab_width = table
        .rows
        .iter()
        .map(|r| r.metabolite.chars().count())
        .chain(std::iter::once("metabolite".len()))
        .max()
        .unwrap_or(10)
        .min(32);
    let plate_width = table
        .rows
        .iter()
        .map(|r| r.plate.chars().count())
        .chain(std::iter::once("plate".len()))
        .max()
        .unwrap_or(5);

    out.push_str(&format!(
        "{:<plate_width$} {:<metab_width$}",
        "plate", "metabolite"
    ));
    for strain in &table.strains {
        out.push_str(&format!(" {:>8}", truncate(strain, 8)));
    }
    out.push('\n');

    out.push_str(&format!(
        "{:-<plate_width$} {:-<metab_width$}",
        "", ""
    ));
    for _ in &table.strains {
        out.push_str(&format!(" {:->8}", ""));
    }
    out.push('\n');

    for row in &table.rows {
        out.push_str(&format!(
            "{:<plate_width$} {:<metab_width$}",
            truncate(&row.plate, plate_width),
            truncate(&row.metabolite, metab_width),
        ));
        for call in &row.calls {
            let cell = call
                .map(|c| c.to_string())
                .unwrap_or_else(|| NO_CALL.to_string());
            out.push_str(&format!(" {cell:>8}"));
        }
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
