//! Per-document outcome of an ingestion run

use serde::{Deserialize, Serialize};
use std::fmt;

use super::unit::UnitKind;

/// Pipeline state for one document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Idle,
    SchemaReset,
    Extracting,
    Writing,
    Done,
    Failed,
}

impl IngestState {
    /// Whether the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestState::Done | IngestState::Failed)
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Idle => "idle",
            IngestState::SchemaReset => "schema_reset",
            IngestState::Extracting => "extracting",
            IngestState::Writing => "writing",
            IngestState::Done => "done",
            IngestState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Units of one kind skipped on a page because extraction failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitWarning {
    pub page: u32,
    pub unit: UnitKind,
    pub message: String,
}

/// An action the backend rejected during a bulk write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub status: u16,
    pub error_type: String,
    pub reason: String,
}

/// Totals for one bulk write
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkSummary {
    /// Actions accepted by the backend
    pub succeeded: usize,
    /// Actions rejected by the backend
    pub failed: Vec<ItemFailure>,
    /// Requests sent
    pub batches: usize,
}

impl BulkSummary {
    /// Actions submitted
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Outcome of `ingest` for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub doc_id: String,
    /// Final state: `Done` or `Failed`
    pub state: IngestState,
    /// Actions produced by the generator
    pub actions_generated: usize,
    /// Actions accepted by the backend
    pub indexed: usize,
    pub item_failures: Vec<ItemFailure>,
    pub warnings: Vec<UnitWarning>,
    /// Fatal error message when the run failed
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl IngestReport {
    /// Empty report for a document about to run
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            state: IngestState::Idle,
            actions_generated: 0,
            indexed: 0,
            item_failures: Vec::new(),
            warnings: Vec::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Whether the document reached `Done`
    pub fn is_success(&self) -> bool {
        self.state == IngestState::Done
    }
}
