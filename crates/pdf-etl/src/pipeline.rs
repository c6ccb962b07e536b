//! Pipeline orchestrator
//!
//! Runs one document through schema reset, extraction and bulk write:
//!
//! ```text
//! Idle -> SchemaReset -> Extracting -> Writing -> Done
//!              \              \            \
//!               +--------------+------------+--> Failed
//! ```
//!
//! Runs are serialized: the reset drops the whole index, so two runs must
//! never interleave. Callers always get an [`IngestReport`] back, never an
//! error.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::actions::Actions;
use crate::backend::{ElasticsearchBackend, SearchBackend};
use crate::bulk::BulkIndexer;
use crate::config::EtlConfig;
use crate::error::{Error, Result};
use crate::extraction::{PageSource, PdfExtractor};
use crate::schema::SchemaManager;
use crate::types::{BulkSummary, IngestReport, IngestState};

/// Document id for a staged file: its name without extension
pub fn doc_id_for_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// PDF files directly inside `dir`, sorted by file name
pub fn pdf_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// ETL pipeline bound to one backend and index
pub struct Pipeline {
    backend: Arc<dyn SearchBackend>,
    index: String,
    bulk: BulkIndexer,
    run_lock: Mutex<()>,
}

impl Pipeline {
    /// Pipeline over an existing backend client
    pub fn new(backend: Arc<dyn SearchBackend>, config: &EtlConfig) -> Self {
        Self {
            backend,
            index: config.index.name.clone(),
            bulk: BulkIndexer::new(&config.bulk),
            run_lock: Mutex::new(()),
        }
    }

    /// Validate the config and connect to Elasticsearch
    pub fn from_config(config: &EtlConfig) -> Result<Self> {
        config.validate()?;
        let backend = ElasticsearchBackend::new(&config.backend)?;
        tracing::info!(
            "Pipeline configured: {} -> index '{}'",
            config.backend.url,
            config.index.name
        );
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Destination index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Shared backend client
    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Ingest one PDF file
    pub async fn ingest(&self, doc_id: &str, path: impl AsRef<Path>) -> IngestReport {
        let path = path.as_ref().to_path_buf();
        let open = async move {
            tokio::task::spawn_blocking(move || PdfExtractor::open(&path))
                .await
                .map_err(|e| Error::internal(format!("document open task failed: {}", e)))?
        };
        self.run(doc_id, open).await
    }

    /// Ingest pages from any source
    pub async fn ingest_source<S>(&self, doc_id: &str, source: S) -> IngestReport
    where
        S: PageSource + Send,
    {
        self.run(doc_id, async move { Ok(source) }).await
    }

    /// Ingest documents strictly one after another, in the given order
    pub async fn ingest_many<P>(&self, documents: &[(String, P)]) -> Vec<IngestReport>
    where
        P: AsRef<Path> + Sync,
    {
        let mut reports = Vec::with_capacity(documents.len());
        for (doc_id, path) in documents {
            reports.push(self.ingest(doc_id, path).await);
        }
        reports
    }

    /// Ingest every PDF in a directory, named by file stem
    ///
    /// Fails only if the directory cannot be listed.
    pub async fn ingest_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<IngestReport>> {
        let dir = dir.as_ref();
        let documents: Vec<(String, PathBuf)> = pdf_files(dir)?
            .into_iter()
            .map(|path| (doc_id_for_path(&path), path))
            .collect();
        tracing::info!("Found {} PDF files in {}", documents.len(), dir.display());
        Ok(self.ingest_many(&documents).await)
    }

    async fn run<S, F>(&self, doc_id: &str, open: F) -> IngestReport
    where
        S: PageSource + Send,
        F: Future<Output = Result<S>> + Send,
    {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        let mut report = IngestReport::new(doc_id);

        let outcome = self.execute(&mut report, open).await;
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                transition(&mut report, IngestState::Done);
                tracing::info!(
                    "Ingested {}: {} of {} actions indexed, {} rejected, {} warnings in {}ms",
                    report.doc_id,
                    report.indexed,
                    report.actions_generated,
                    report.item_failures.len(),
                    report.warnings.len(),
                    report.elapsed_ms
                );
            }
            Err(e) => {
                tracing::error!(
                    "Ingestion of {} failed during {}: {}",
                    report.doc_id,
                    report.state,
                    e
                );
                report.error = Some(e.to_string());
                transition(&mut report, IngestState::Failed);
            }
        }

        report
    }

    async fn execute<S, F>(&self, report: &mut IngestReport, open: F) -> Result<()>
    where
        S: PageSource + Send,
        F: Future<Output = Result<S>> + Send,
    {
        transition(report, IngestState::SchemaReset);
        SchemaManager::new(self.backend.as_ref())
            .reinitialize(&self.index)
            .await?;

        transition(report, IngestState::Extracting);
        let source = open.await?;
        tracing::debug!("{} has {} pages", report.doc_id, source.page_count());
        let mut actions = Actions::new(source, report.doc_id.clone(), self.index.clone());

        transition(report, IngestState::Writing);
        let mut summary = BulkSummary::default();
        let written = self
            .bulk
            .write_into(self.backend.as_ref(), &mut actions, &mut summary)
            .await;

        report.actions_generated = actions.generated();
        report.warnings = actions.take_warnings();
        report.indexed = summary.succeeded;
        report.item_failures = summary.failed;
        written
    }
}

fn transition(report: &mut IngestReport, next: IngestState) {
    tracing::info!("{}: {} -> {}", report.doc_id, report.state, next);
    report.state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::extraction::{StaticPage, StaticSource};
    use tempfile::TempDir;

    fn pipeline() -> (Arc<MemoryBackend>, Pipeline) {
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = Pipeline::new(backend.clone(), &EtlConfig::default());
        (backend, pipeline)
    }

    #[test]
    fn test_doc_id_for_path() {
        assert_eq!(doc_id_for_path("/uploads/report.pdf"), "report");
        assert_eq!(doc_id_for_path("Annual.Report.PDF"), "Annual.Report");
        assert_eq!(doc_id_for_path("notes"), "notes");
    }

    #[test]
    fn test_pdf_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.PDF", "c.txt", "d.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<_> = pdf_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_successful_run_reaches_done() {
        let (backend, pipeline) = pipeline();
        let source = StaticSource::new(vec![StaticPage::text("Intro\n\nBody text")]);

        let report = pipeline.ingest_source("report", source).await;

        assert!(report.is_success());
        assert_eq!(report.state, IngestState::Done);
        assert_eq!(report.actions_generated, 2);
        assert_eq!(report.indexed, 2);
        assert!(report.error.is_none());
        assert_eq!(backend.count("pdf_data").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_failure_is_reported_not_raised() {
        let (backend, pipeline) = pipeline();
        backend.set_offline(true);

        let report = pipeline
            .ingest_source("doc", StaticSource::new(vec![StaticPage::text("x")]))
            .await;

        assert_eq!(report.state, IngestState::Failed);
        assert_eq!(report.actions_generated, 0);
        let error = report.error.unwrap();
        assert!(error.contains("Schema reset failed"), "{}", error);
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_after_reset() {
        let (backend, pipeline) = pipeline();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let report = pipeline.ingest("broken", &path).await;

        assert_eq!(report.state, IngestState::Failed);
        assert!(report.error.unwrap().contains("broken.pdf"));
        assert!(backend.index_exists("pdf_data").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_document_does_not_block_next() {
        let (_backend, pipeline) = pipeline();
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.pdf");

        let first = pipeline.ingest("missing", &missing).await;
        let second = pipeline
            .ingest_source("ok", StaticSource::new(vec![StaticPage::text("fine")]))
            .await;

        assert!(!first.is_success());
        assert!(second.is_success());
        assert_eq!(second.indexed, 1);
    }
}
