//! Content units derived from document pages

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::RawValue;

/// Kind of content unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Paragraph of page text
    Paragraph,
    /// Table detected on a page
    Table,
    /// Embedded image
    Image,
}

impl UnitKind {
    /// Value of the `type` field in index records
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Paragraph => "paragraph",
            UnitKind::Table => "table",
            UnitKind::Image => "image",
        }
    }

    /// Short tag used inside action ids
    pub fn id_tag(&self) -> &'static str {
        match self {
            UnitKind::Paragraph => "para",
            UnitKind::Table => "table",
            UnitKind::Image => "img",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One paragraph of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphUnit {
    /// Owning document
    pub doc_id: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Position on the page (0-indexed)
    pub paragraph_index: usize,
    /// Trimmed paragraph text
    pub text: String,
}

/// One row of a table, keyed by column name in header order
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    fields: Vec<(String, RawValue)>,
}

impl TableRecord {
    /// Build a record from ordered (column, value) pairs
    pub fn new(fields: Vec<(String, RawValue)>) -> Self {
        Self { fields }
    }

    /// Value for a column
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &RawValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Cells joined with `", "`; nulls render empty
    pub fn render(&self) -> String {
        self.values()
            .map(RawValue::render)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One table of a page
#[derive(Debug, Clone, PartialEq)]
pub struct TableUnit {
    /// Owning document
    pub doc_id: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Position on the page (0-indexed)
    pub table_index: usize,
    /// Column names (unique)
    pub columns: Vec<String>,
    /// Records, each with exactly `columns.len()` fields
    pub rows: Vec<TableRecord>,
}

impl TableUnit {
    /// Flattened text: one line per row
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(TableRecord::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One embedded image of a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUnit {
    /// Owning document
    pub doc_id: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Position on the page (0-indexed)
    pub image_index: usize,
    /// JSON-safe image attributes
    pub metadata: serde_json::Value,
    /// Always empty at extraction time
    pub caption: String,
}
