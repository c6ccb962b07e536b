//! Table detection over extracted page text
//!
//! A line is a grid row when it splits into at least two cells on tabs, `|`
//! separators, or runs of two or more spaces. Two or more consecutive grid
//! rows form one table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{RawTable, RawValue};

/// Minimum cells for a line to count as a grid row
const MIN_CELLS: usize = 2;
/// Minimum consecutive grid rows for a table
const MIN_ROWS: usize = 2;

static WIDE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid gap regex"));

/// Markdown-style rule rows such as `|---|:--:|`
static RULE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|?[\s:\-|+]*-[\s:\-|+]*\|?$").expect("valid rule regex"));

/// Detect raw tables in page text, in order of appearance
pub fn detect_text_grids(text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: RawTable = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if !current.is_empty() && RULE_ROW.is_match(trimmed) && trimmed.contains('|') {
            continue;
        }

        match split_cells(trimmed) {
            Some(cells) => current.push(cells),
            None => flush(&mut current, &mut tables),
        }
    }
    flush(&mut current, &mut tables);

    tables
}

fn flush(current: &mut RawTable, tables: &mut Vec<RawTable>) {
    if current.len() >= MIN_ROWS {
        tables.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Cells of a grid row, or `None` if the line is not one
fn split_cells(line: &str) -> Option<Vec<RawValue>> {
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else if line.contains('|') {
        let inner = line.strip_prefix('|').unwrap_or(line);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        inner.split('|').collect()
    } else {
        WIDE_GAP.split(line).collect()
    };

    if parts.len() < MIN_CELLS {
        return None;
    }

    Some(
        parts
            .into_iter()
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    RawValue::Null
                } else {
                    RawValue::from(cell)
                }
            })
            .collect(),
    )
}
