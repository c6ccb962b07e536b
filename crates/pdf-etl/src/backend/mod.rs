//! Search backend abstraction
//!
//! The pipeline only ever writes to the engine: it checks, drops and creates
//! the index, then bulk-writes actions into it.

mod elasticsearch;
mod memory;

pub use elasticsearch::ElasticsearchBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::IndexAction;

/// Outcome of one action inside a bulk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    /// Action id
    pub id: String,
    /// HTTP-style status the engine reported for the item
    pub status: u16,
    /// Set when the engine rejected the item
    pub error: Option<BulkItemError>,
}

impl BulkItem {
    /// Accepted item
    pub fn ok(id: impl Into<String>, status: u16) -> Self {
        Self {
            id: id.into(),
            status,
            error: None,
        }
    }

    /// Rejected item
    pub fn rejected(
        id: impl Into<String>,
        status: u16,
        error_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            error: Some(BulkItemError {
                error_type: error_type.into(),
                reason: reason.into(),
            }),
        }
    }
}

/// Why the engine rejected an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    pub error_type: String,
    pub reason: String,
}

/// Cluster banner returned by [`SearchBackend::info`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterInfo {
    pub name: String,
    pub cluster_name: String,
    pub version: String,
}

/// Trait for text-indexing engines the pipeline writes to
///
/// Implementations:
/// - `ElasticsearchBackend`: Elasticsearch over HTTPS
/// - `MemoryBackend`: in-process engine for tests and dry runs
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Check whether an index exists
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Delete an index and everything in it
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Create an index from a settings + mappings body
    async fn create_index(&self, index: &str, body: &Value) -> Result<()>;

    /// Write a batch of actions; one result per action, in order
    ///
    /// An `Err` means the request as a whole failed. Rejected items are
    /// reported through [`BulkItem::error`].
    async fn bulk(&self, actions: &[IndexAction]) -> Result<Vec<BulkItem>>;

    /// Number of records in an index
    async fn count(&self, index: &str) -> Result<u64>;

    /// Cluster name and version
    async fn info(&self) -> Result<ClusterInfo>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
