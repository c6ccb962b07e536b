//! In-process search backend
//!
//! Keeps indexes in memory and applies the same field-type checks the engine
//! applies to mapped fields, so rejected items surface the same way.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{BulkItem, ClusterInfo, SearchBackend};
use crate::error::{Error, Result};
use crate::types::{IndexAction, IndexRecord};

#[derive(Debug, Default)]
struct MemoryIndex {
    /// Body the index was created with
    body: Value,
    /// Records by id
    records: BTreeMap<String, IndexRecord>,
}

impl MemoryIndex {
    /// Declared type of a top-level field, if mapped
    fn field_type(&self, field: &str) -> Option<&str> {
        self.body
            .pointer(&format!("/mappings/properties/{}/type", field))
            .and_then(Value::as_str)
    }

    /// Reason a record cannot be stored under this mapping
    fn reject_reason(&self, source: &Value) -> Option<String> {
        let fields = source.as_object()?;
        for (field, value) in fields {
            let Some(field_type) = self.field_type(field) else {
                continue;
            };
            let fits = match field_type {
                "text" | "keyword" => !value.is_object(),
                "integer" | "long" => value.is_i64() || value.is_u64() || value.is_null(),
                _ => true,
            };
            if !fits {
                return Some(format!(
                    "failed to parse field [{}] of type [{}]",
                    field, field_type
                ));
            }
        }
        None
    }
}

/// In-memory search backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
    /// Calls received, e.g. `"delete pdf_data"`
    operations: RwLock<Vec<String>>,
    offline: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the engine were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls received so far, oldest first
    pub fn operations(&self) -> Vec<String> {
        self.operations.read().clone()
    }

    /// Records stored in an index, ordered by id
    pub fn records(&self, index: &str) -> Vec<(String, IndexRecord)> {
        self.indexes
            .read()
            .get(index)
            .map(|idx| {
                idx.records
                    .iter()
                    .map(|(id, record)| (id.clone(), record.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One record by id
    pub fn get(&self, index: &str, id: &str) -> Option<IndexRecord> {
        self.indexes
            .read()
            .get(index)
            .and_then(|idx| idx.records.get(id).cloned())
    }

    /// Body an index was created with
    pub fn index_body(&self, index: &str) -> Option<Value> {
        self.indexes.read().get(index).map(|idx| idx.body.clone())
    }

    fn record(&self, operation: String) -> Result<()> {
        self.operations.write().push(operation);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::backend("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        self.record(format!("exists {}", index))?;
        Ok(self.indexes.read().contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.record(format!("delete {}", index))?;
        self.indexes.write().remove(index);
        Ok(())
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        self.record(format!("create {}", index))?;
        let mut indexes = self.indexes.write();
        if indexes.contains_key(index) {
            return Err(Error::backend(format!(
                "create index failed (400): resource_already_exists_exception [{}]",
                index
            )));
        }
        indexes.insert(
            index.to_string(),
            MemoryIndex {
                body: body.clone(),
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn bulk(&self, actions: &[IndexAction]) -> Result<Vec<BulkItem>> {
        self.record(format!("bulk {}", actions.len()))?;
        let mut indexes = self.indexes.write();
        let mut items = Vec::with_capacity(actions.len());

        for action in actions {
            let index = indexes.entry(action.index.clone()).or_default();
            let source = serde_json::to_value(&action.source)?;

            if let Some(reason) = index.reject_reason(&source) {
                items.push(BulkItem::rejected(
                    action.id.clone(),
                    400,
                    "document_parsing_exception",
                    reason,
                ));
                continue;
            }

            let replaced = index
                .records
                .insert(action.id.clone(), action.source.clone())
                .is_some();
            items.push(BulkItem::ok(action.id.clone(), if replaced { 200 } else { 201 }));
        }

        Ok(items)
    }

    async fn count(&self, index: &str) -> Result<u64> {
        self.record(format!("count {}", index))?;
        self.indexes
            .read()
            .get(index)
            .map(|idx| idx.records.len() as u64)
            .ok_or_else(|| Error::backend(format!("index_not_found_exception [{}]", index)))
    }

    async fn info(&self) -> Result<ClusterInfo> {
        self.record("info".to_string())?;
        Ok(ClusterInfo {
            name: "memory".to_string(),
            cluster_name: "in-process".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
