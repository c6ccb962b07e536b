//! Index schema manager
//!
//! Every ingestion run rebuilds the index from scratch: an existing index is
//! dropped together with all of its records, then recreated with the
//! edge n-gram analysis settings below.

use serde_json::{json, Value};

use crate::backend::SearchBackend;
use crate::error::{Error, Result};

/// Name of the custom analyzer applied to free-text fields
pub const ANALYZER_NAME: &str = "edge_ngram_analyzer";
/// Name of the edge n-gram token filter
pub const FILTER_NAME: &str = "edge_ngram_filter";
/// Shortest generated prefix
pub const MIN_GRAM: u32 = 2;
/// Longest generated prefix
pub const MAX_GRAM: u32 = 15;

/// Free-text fields analyzed with the edge n-gram analyzer
pub const TEXT_FIELDS: &[&str] = &["content", "caption", "image_metadata"];

/// Settings and mappings the index is created with
pub fn index_body() -> Value {
    let text_field = json!({
        "type": "text",
        "analyzer": ANALYZER_NAME,
        "search_analyzer": "standard"
    });

    json!({
        "settings": {
            "analysis": {
                "analyzer": {
                    ANALYZER_NAME: {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", FILTER_NAME]
                    }
                },
                "filter": {
                    FILTER_NAME: {
                        "type": "edge_ngram",
                        "min_gram": MIN_GRAM,
                        "max_gram": MAX_GRAM
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "pdf_id": { "type": "keyword" },
                "type": { "type": "keyword" },
                "page": { "type": "integer" },
                "content": text_field.clone(),
                "caption": text_field.clone(),
                "image_metadata": text_field
            }
        }
    })
}

/// Manages the destination index lifecycle
pub struct SchemaManager<'a> {
    backend: &'a dyn SearchBackend,
}

impl<'a> SchemaManager<'a> {
    pub fn new(backend: &'a dyn SearchBackend) -> Self {
        Self { backend }
    }

    /// Drop `index` if it exists, then create it with [`index_body`]
    ///
    /// Destroys every record in the index, not only those of the document
    /// about to be ingested. Any failure is reported as
    /// [`Error::SchemaReset`], except deadlines which stay
    /// [`Error::Timeout`].
    pub async fn reinitialize(&self, index: &str) -> Result<()> {
        let wrap = |e: Error| match e {
            Error::Timeout(_) => e,
            other => Error::schema_reset(index, other.to_string()),
        };

        if self.backend.index_exists(index).await.map_err(wrap)? {
            tracing::info!("Dropping existing index '{}'", index);
            self.backend.delete_index(index).await.map_err(wrap)?;
        }

        self.backend
            .create_index(index, &index_body())
            .await
            .map_err(wrap)?;
        tracing::info!(
            "Created index '{}' on {} (edge n-grams {}-{})",
            index,
            self.backend.name(),
            MIN_GRAM,
            MAX_GRAM
        );
        Ok(())
    }
}
