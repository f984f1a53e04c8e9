//! Terminal tables for the subcommands.

use crate::comparison::{ComparisonReport, DimensionOutcome, DimensionRow};
use crate::plugins::PluginRegistry;
use crate::store::StoredRun;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{CellAlignment, ContentArrangement, Table};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn right_align(table: &mut Table, columns: &[usize]) {
    for &i in columns {
        if let Some(column) = table.column_mut(i) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn score_cell(score: f64, low: f64, high: f64, low_confidence: bool) -> String {
    let marker = if low_confidence { " *" } else { "" };
    format!("{score:.2} [{low:.2}, {high:.2}]{marker}")
}

fn dimension_cells(row: &DimensionRow) -> Vec<String> {
    let (a, b, winner) = match &row.outcome {
        DimensionOutcome::Scored { a, b, winner, .. } => (
            score_cell(
                a.size_adjusted,
                a.display_interval.low,
                a.display_interval.high,
                a.low_confidence,
            ),
            score_cell(
                b.size_adjusted,
                b.display_interval.low,
                b.display_interval.high,
                b.low_confidence,
            ),
            winner.to_string(),
        ),
        DimensionOutcome::Unavailable { .. } => {
            let reason = row.unavailable_reason().unwrap_or_default();
            ("-".to_string(), "-".to_string(), format!("unavailable ({reason})"))
        }
    };
    vec![
        row.dimension.to_string(),
        format!("{:.1}%", row.weight_share * 100.0),
        a,
        b,
        winner,
    ]
}

/// Per-dimension scores with intervals, followed by the totals row.
pub fn comparison_table(report: &ComparisonReport) -> Table {
    let mut table = new_table(vec![
        "Dimension",
        "Weight",
        report.codebase_a_label.as_str(),
        report.codebase_b_label.as_str(),
        "Winner",
    ]);
    for row in &report.per_dimension {
        table.add_row(dimension_cells(row));
    }
    table.add_row(vec![
        "TOTAL".to_string(),
        "100.0%".to_string(),
        format!("{:.2}", report.total_a),
        format!("{:.2}", report.total_b),
        report.overall_winner.to_string(),
    ]);
    right_align(&mut table, &[1, 2, 3]);
    table
}

pub fn history_table(runs: &[StoredRun]) -> Table {
    let mut table = new_table(vec!["Run", "Timestamp", "A", "B", "Total A", "Total B", "Verdict"]);
    for run in runs {
        let r = &run.report;
        table.add_row(vec![
            run.run_id.to_string(),
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.codebase_a_id.to_string(),
            r.codebase_b_id.to_string(),
            format!("{:.2}", r.total_a),
            format!("{:.2}", r.total_b),
            format!("{} ({})", r.overall_winner, r.margin_classification),
        ]);
    }
    right_align(&mut table, &[0, 4, 5]);
    table
}

pub fn plugins_table(registry: &PluginRegistry) -> Table {
    let mut table = new_table(vec!["Dimension", "Polarity", "Size policy", "Languages", "Description"]);
    for plugin in registry.plugins() {
        let languages = plugin
            .supported_languages()
            .map(|langs| {
                langs
                    .iter()
                    .map(|l| l.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "any".to_string());
        table.add_row(vec![
            plugin.dimension().to_string(),
            plugin.polarity().to_string(),
            plugin.size_policy().to_string(),
            languages,
            plugin.description().to_string(),
        ]);
    }
    table
}
