//! Core types for the ETL pipeline

pub mod action;
pub mod report;
pub mod unit;

pub use action::{IndexAction, IndexRecord};
pub use report::{BulkSummary, IngestReport, IngestState, ItemFailure, UnitWarning};
pub use unit::{ImageUnit, ParagraphUnit, TableRecord, TableUnit, UnitKind};
