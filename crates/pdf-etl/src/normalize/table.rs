//! Table normalization
//!
//! A raw grid becomes a list of records keyed by a unique header. Rows are
//! padded with nulls or truncated to the header width.

use std::collections::{HashMap, HashSet};

use super::value::RawValue;
use crate::types::{TableRecord, TableUnit};

/// A raw grid as detected on a page: rows of cells, cells may be null
pub type RawTable = Vec<Vec<RawValue>>;

/// Builds table units from raw grids
#[derive(Debug, Clone, Copy, Default)]
pub struct TableNormalizer;

impl TableNormalizer {
    /// Normalize one raw grid
    ///
    /// The first row is the header when there are at least two rows and the
    /// header row is non-empty. Otherwise every row is kept and columns are
    /// named by position (`"0"`, `"1"`, ...).
    pub fn normalize(doc_id: &str, page: u32, table_index: usize, raw: &RawTable) -> TableUnit {
        let (columns, rows) = match raw.split_first() {
            Some((header, body)) if !body.is_empty() && !header.is_empty() => {
                let columns = unique_headers(header);
                let rows = body
                    .iter()
                    .map(|row| conform_row(&columns, row))
                    .collect();
                (columns, rows)
            }
            _ => {
                let width = raw.iter().map(Vec::len).max().unwrap_or(0);
                let columns: Vec<String> = (0..width).map(|i| i.to_string()).collect();
                let rows = raw.iter().map(|row| conform_row(&columns, row)).collect();
                (columns, rows)
            }
        };

        TableUnit {
            doc_id: doc_id.to_string(),
            page,
            table_index,
            columns,
            rows,
        }
    }
}

/// Unique column names for a header row
///
/// Scalars are stringified and trimmed; anything else, and empty names,
/// become `col_{index}`. A repeated name gets `_{n}`, `n` counting that
/// name's collisions from 1. Generated names skip anything already used or
/// present verbatim elsewhere in the header, so the first occurrence of every
/// name survives unchanged.
pub fn unique_headers(cells: &[RawValue]) -> Vec<String> {
    let bases: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            cell.scalar_text()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("col_{}", idx))
        })
        .collect();

    let reserved: HashSet<&str> = bases.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(bases.len());
    let mut collisions: HashMap<&str, usize> = HashMap::new();
    let mut names = Vec::with_capacity(bases.len());

    for base in &bases {
        if used.insert(base.clone()) {
            names.push(base.clone());
            continue;
        }

        let count = collisions.entry(base.as_str()).or_insert(0);
        let name = loop {
            *count += 1;
            let candidate = format!("{}_{}", base, count);
            if !used.contains(&candidate) && !reserved.contains(candidate.as_str()) {
                break candidate;
            }
        };
        used.insert(name.clone());
        names.push(name);
    }

    names
}

/// Pad with nulls or truncate a row to the header width
fn conform_row(columns: &[String], row: &[RawValue]) -> TableRecord {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or(RawValue::Null)))
        .collect();
    TableRecord::new(fields)
}
