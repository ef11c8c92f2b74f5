//! Contribution Parser
//!
//! Reads the tab-delimited text format:
//!
//! ```text
//! tab	sites
//! site	lat	lon
//! ak01	61.2	-149.9
//! tab	samples
//! ...
//! ```
//!
//! A block starts with a `tab<TAB>name` marker line, followed by one header
//! line of column names and zero or more data lines. Tokens are trimmed,
//! blank lines are ignored. Values are kept as strings exactly as written.
//!
//! Parsing is best effort: whatever was built is returned next to the
//! diagnostics, even when errors occurred.

use crate::contribution::{Contribution, Row};
use crate::diagnostics::{Diagnostics, Outcome};
use thiserror::Error;
use tracing::debug;

/// First token of a line that starts a new table.
pub const TABLE_MARKER: &str = "tab";

const FIELD_DELIMITER: char = '\t';

/// Structural errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized column delimiter \"{token}\" in line {line}. Expected \"tab\".")]
    UnrecognizedDelimiter { token: String, line: usize },

    #[error("No table name following tab delimiter in line {line}.")]
    MissingTableName { line: usize },

    #[error("Found duplicate column names in table \"{table}\" in line {line}: {columns}.")]
    DuplicateColumns {
        table: String,
        line: usize,
        columns: String,
    },
}

/// Recoverable problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("The contribution text input is empty.")]
    EmptyInput,

    #[error("No data values were found in table \"{table}\".")]
    NoDataValues { table: String },

    #[error(
        "Line {line} in table \"{table}\" has {found} values for {expected} columns. \
         Extra values were ignored."
    )]
    ExtraValues {
        table: String,
        line: usize,
        found: usize,
        expected: usize,
    },
}

/// A non-blank input line with its 1-based position in the original text.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn tokens(&self) -> impl Iterator<Item = &'a str> {
        self.text.split(FIELD_DELIMITER).map(str::trim)
    }

    fn starts_table(&self) -> bool {
        self.tokens().next() == Some(TABLE_MARKER)
    }
}

/// Parse contribution text into tables of rows.
pub fn parse(text: &str) -> Outcome<Contribution> {
    let mut diagnostics = Diagnostics::new();
    let mut contribution = Contribution::new();

    let lines: Vec<Line<'_>> = text
        .split('\n')
        .enumerate()
        .map(|(idx, text)| Line {
            number: idx + 1,
            text,
        })
        .filter(|line| !line.text.trim().is_empty())
        .collect();

    if lines.is_empty() {
        diagnostics.warning(ParseWarning::EmptyInput);
        return Outcome::new(contribution, diagnostics);
    }

    let mut cursor = 0;
    while cursor < lines.len() {
        let marker_line = lines[cursor];
        let mut tokens = marker_line.tokens();
        let marker = tokens.next().unwrap_or_default();

        if marker != TABLE_MARKER {
            diagnostics.error(ParseError::UnrecognizedDelimiter {
                token: marker.to_string(),
                line: marker_line.number,
            });
            break;
        }
        cursor += 1;

        let table = tokens.next().unwrap_or_default();
        if table.is_empty() {
            diagnostics.error(ParseError::MissingTableName {
                line: marker_line.number,
            });
            cursor = next_table_start(&lines, cursor);
            continue;
        }

        // A marker right after a marker means this table has no header
        let header: Vec<&str> = match lines.get(cursor) {
            Some(line) if !line.starts_table() => {
                cursor += 1;
                line.tokens().collect()
            }
            _ => Vec::new(),
        };
        if let Some(columns) = duplicate_columns(&header) {
            diagnostics.error(ParseError::DuplicateColumns {
                table: table.to_string(),
                line: lines[cursor - 1].number,
                columns,
            });
        }

        contribution.insert_table(table);
        let block_end = next_table_start(&lines, cursor);
        for line in &lines[cursor..block_end] {
            let row = read_row(table, &header, line, &mut diagnostics);
            contribution.push_row(table, row);
        }
        if block_end == cursor {
            diagnostics.warning(ParseWarning::NoDataValues {
                table: table.to_string(),
            });
        }
        cursor = block_end;
    }

    debug!(
        tables = contribution.len(),
        errors = diagnostics.errors.len(),
        warnings = diagnostics.warnings.len(),
        "Parsed contribution text"
    );
    Outcome::new(contribution, diagnostics)
}

/// Index of the next line that starts a table, or the end
fn next_table_start(lines: &[Line<'_>], from: usize) -> usize {
    lines[from..]
        .iter()
        .position(Line::starts_table)
        .map_or(lines.len(), |offset| from + offset)
}

/// `"col1", "col2"` for each name that appears more than once
fn duplicate_columns(header: &[&str]) -> Option<String> {
    let mut duplicates: Vec<&str> = Vec::new();
    for (idx, name) in header.iter().enumerate() {
        if !name.is_empty() && header[..idx].contains(name) && !duplicates.contains(name) {
            duplicates.push(*name);
        }
    }
    if duplicates.is_empty() {
        return None;
    }
    Some(
        duplicates
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Assign a data line's values to header columns by position.
///
/// The first occurrence of a duplicated column keeps its value; blank header
/// positions are skipped; values beyond the header are reported and dropped.
fn read_row(table: &str, header: &[&str], line: &Line<'_>, diagnostics: &mut Diagnostics) -> Row {
    let values: Vec<&str> = line.tokens().collect();
    let mut row = Row::new();

    for (column, value) in header.iter().zip(&values) {
        if column.is_empty() || row.contains_key(*column) {
            continue;
        }
        row.insert((*column).to_string(), (*value).to_string());
    }

    let found = values
        .iter()
        .rposition(|value| !value.is_empty())
        .map_or(0, |idx| idx + 1);
    if found > header.len() {
        diagnostics.warning(ParseWarning::ExtraValues {
            table: table.to_string(),
            line: line.number,
            found,
            expected: header.len(),
        });
    }

    row
}
