//! Output formatting utilities for CLI commands
//!
//! Provides consistent formatting for:
//! - Contribution tables, one terminal table per contribution table
//! - Diagnostics grouped by channel
//! - The machine-readable report behind `--json`

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use magic_contribution::{Contribution, Diagnostic, Diagnostics, Row};
use serde::Serialize;

/// Machine-readable result of `parse` and `upgrade`
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub contribution: &'a Contribution,
    pub errors: Vec<&'a Diagnostic>,
    pub warnings: Vec<&'a Diagnostic>,
}

impl<'a> Report<'a> {
    pub fn new(contribution: &'a Contribution, diagnostics: &'a [Diagnostics]) -> Self {
        Self {
            contribution,
            errors: diagnostics.iter().flat_map(|d| &d.errors).collect(),
            warnings: diagnostics.iter().flat_map(|d| &d.warnings).collect(),
        }
    }
}

/// Print a table with headers
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Column names across all rows, in first-seen order.
///
/// Rows of one table usually share their keys, but after an upgrade a
/// merged column may be present in some rows only.
pub fn column_union(rows: &[Row]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns
}

/// Cell values for `rows` under `columns`; absent keys render empty
pub fn table_cells(columns: &[&str], rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Print every table of a contribution
pub fn print_contribution(contribution: &Contribution) {
    if contribution.is_empty() {
        println!("(no tables)");
        return;
    }

    for (name, rows) in contribution.tables() {
        println!();
        println!("TABLE: {} ({} rows)", name, rows.len());
        let columns = column_union(rows);
        if columns.is_empty() {
            println!("  (no columns)");
            continue;
        }
        print_table(&columns, table_cells(&columns, rows));
    }
}

/// Print errors then warnings, prefixed with their channel
pub fn print_diagnostics(diagnostics: &[Diagnostics]) {
    let errors: Vec<&Diagnostic> = diagnostics.iter().flat_map(|d| &d.errors).collect();
    let warnings: Vec<&Diagnostic> = diagnostics.iter().flat_map(|d| &d.warnings).collect();

    if errors.is_empty() && warnings.is_empty() {
        return;
    }

    println!();
    for error in errors {
        println!("ERROR: {}", error);
    }
    for warning in warnings {
        println!("WARNING: {}", warning);
    }
}

/// One-line summary, e.g. "3 tables, 1 error, 2 warnings"
pub fn summary(contribution: &Contribution, diagnostics: &[Diagnostics]) -> String {
    let errors: usize = diagnostics.iter().map(|d| d.errors.len()).sum();
    let warnings: usize = diagnostics.iter().map(|d| d.warnings.len()).sum();
    format!(
        "{}, {}, {}",
        plural(contribution.len(), "table"),
        plural(errors, "error"),
        plural(warnings, "warning"),
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magic_contribution::contribution::row;

    #[test]
    fn test_column_union_keeps_first_seen_order() {
        let rows = vec![row([("a", "1"), ("b", "2")]), row([("c", "3"), ("a", "4")])];
        assert_eq!(column_union(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_table_cells_fill_missing() {
        let rows = vec![row([("a", "1")]), row([("b", "2")])];
        let cells = table_cells(&["a", "b"], &rows);
        assert_eq!(cells, vec![vec!["1".to_string(), String::new()], vec![String::new(), "2".to_string()]]);
    }

    #[test]
    fn test_summary() {
        let contribution = Contribution::new().with_table("sites", vec![]);
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("w1");
        diagnostics.warning("w2");

        assert_eq!(summary(&contribution, &[diagnostics]), "1 table, 0 errors, 2 warnings");
    }

    #[test]
    fn test_report_json_shape() {
        let contribution = Contribution::new().with_table("sites", vec![row([("site", "ak01")])]);
        let mut parse = Diagnostics::new();
        parse.warning("parse warning");
        let mut upgrade = Diagnostics::new();
        upgrade.error("upgrade error");
        let all = [parse, upgrade];

        let json = serde_json::to_value(Report::new(&contribution, &all)).unwrap();
        assert_eq!(json["contribution"]["sites"][0]["site"], "ak01");
        assert_eq!(json["errors"], serde_json::json!([{ "message": "upgrade error" }]));
        assert_eq!(json["warnings"], serde_json::json!([{ "message": "parse warning" }]));
    }
}
