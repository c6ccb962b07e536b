//! pdf-etl: PDF extraction and indexing pipeline
//!
//! Extracts paragraphs, tables and images from PDF pages, turns them into
//! indexing actions with deterministic ids, and bulk-writes them into a
//! freshly rebuilt Elasticsearch index.
//!
//! ```no_run
//! use pdf_etl::{EtlConfig, Pipeline};
//!
//! # async fn run() -> pdf_etl::Result<()> {
//! let config = EtlConfig::from_env();
//! let pipeline = Pipeline::from_config(&config)?;
//! let report = pipeline.ingest("report", "uploads/report.pdf").await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod backend;
pub mod bulk;
pub mod config;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use actions::Actions;
pub use backend::{ElasticsearchBackend, MemoryBackend, SearchBackend};
pub use bulk::BulkIndexer;
pub use config::EtlConfig;
pub use error::{Error, Result};
pub use extraction::{PageSource, PdfExtractor, StaticPage, StaticSource};
pub use pipeline::{doc_id_for_path, Pipeline};
pub use schema::SchemaManager;
pub use types::{
    IndexAction, IndexRecord, IngestReport, IngestState, ItemFailure, UnitKind, UnitWarning,
};
