//! Bulk indexer
//!
//! Pulls actions from a lazy sequence and writes them in batches bounded by
//! action count and encoded size. Only the current batch is held in memory.

use crate::backend::SearchBackend;
use crate::config::BulkConfig;
use crate::error::Result;
use crate::types::{BulkSummary, IndexAction, ItemFailure};

/// Batched writer for indexing actions
#[derive(Debug, Clone)]
pub struct BulkIndexer {
    chunk_size: usize,
    max_chunk_bytes: usize,
}

impl Default for BulkIndexer {
    fn default() -> Self {
        Self::new(&BulkConfig::default())
    }
}

impl BulkIndexer {
    pub fn new(config: &BulkConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            max_chunk_bytes: config.max_chunk_bytes.max(1),
        }
    }

    /// Write every action the sequence yields
    ///
    /// Items the backend rejects are collected in the summary and do not stop
    /// the write. A request that fails as a whole aborts with its error.
    pub async fn write<I>(&self, backend: &dyn SearchBackend, actions: I) -> Result<BulkSummary>
    where
        I: IntoIterator<Item = IndexAction>,
        I::IntoIter: Send,
    {
        let mut summary = BulkSummary::default();
        self.write_into(backend, actions, &mut summary).await?;
        Ok(summary)
    }

    /// Like [`write`](Self::write), recording into `summary` as batches land
    ///
    /// When a request fails, `summary` still holds the batches written before
    /// it.
    pub async fn write_into<I>(
        &self,
        backend: &dyn SearchBackend,
        actions: I,
        summary: &mut BulkSummary,
    ) -> Result<()>
    where
        I: IntoIterator<Item = IndexAction>,
        I::IntoIter: Send,
    {
        let mut batch: Vec<IndexAction> = Vec::with_capacity(self.chunk_size);
        let mut batch_bytes = 0usize;
        let mut scratch = Vec::new();

        for action in actions {
            scratch.clear();
            action.write_ndjson(&mut scratch)?;
            let size = scratch.len();

            let full = batch.len() >= self.chunk_size || batch_bytes + size > self.max_chunk_bytes;
            if !batch.is_empty() && full {
                self.flush(backend, &mut batch, summary).await?;
                batch_bytes = 0;
            }

            batch_bytes += size;
            batch.push(action);
        }

        if !batch.is_empty() {
            self.flush(backend, &mut batch, summary).await?;
        }

        Ok(())
    }

    async fn flush(
        &self,
        backend: &dyn SearchBackend,
        batch: &mut Vec<IndexAction>,
        summary: &mut BulkSummary,
    ) -> Result<()> {
        tracing::debug!(
            "Sending bulk request {} with {} actions to {}",
            summary.batches + 1,
            batch.len(),
            backend.name()
        );
        let items = backend.bulk(batch).await?;
        summary.batches += 1;

        for item in items {
            match item.error {
                None => summary.succeeded += 1,
                Some(error) => {
                    tracing::warn!(
                        "Backend rejected {} ({}): {}: {}",
                        item.id,
                        item.status,
                        error.error_type,
                        error.reason
                    );
                    summary.failed.push(ItemFailure {
                        id: item.id,
                        status: item.status,
                        error_type: error.error_type,
                        reason: error.reason,
                    });
                }
            }
        }

        batch.clear();
        Ok(())
    }
}
