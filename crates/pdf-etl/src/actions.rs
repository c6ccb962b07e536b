//! Action generator
//!
//! Walks a page source one page at a time and yields indexing actions:
//! paragraphs, then tables, then images of each page. Nothing beyond the
//! current page is held in memory. Problems on a page become warnings and
//! the affected units are skipped. Page parsing is blocking work; inside a
//! multi-threaded tokio runtime it runs under `block_in_place`.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::extraction::{PageSource, RawPage};
use crate::normalize::{normalize_image_metadata, ParagraphNormalizer, TableNormalizer};
use crate::types::{ImageUnit, IndexAction, UnitKind, UnitWarning};

/// Lazy sequence of indexing actions for one document
///
/// Ids are `{doc_id}_{para|table|img}_{page}_{index}`, where `index` is the
/// unit's position on its page as extracted.
pub struct Actions<S> {
    source: S,
    doc_id: String,
    index: String,
    next_page: u32,
    page_count: u32,
    pending: VecDeque<IndexAction>,
    generated: usize,
    warnings: Vec<UnitWarning>,
}

impl<S: PageSource> Actions<S> {
    /// Generator over every page of `source`
    pub fn new(source: S, doc_id: impl Into<String>, index: impl Into<String>) -> Self {
        let page_count = source.page_count();
        Self {
            source,
            doc_id: doc_id.into(),
            index: index.into(),
            next_page: 1,
            page_count,
            pending: VecDeque::new(),
            generated: 0,
            warnings: Vec::new(),
        }
    }

    /// Actions yielded so far
    pub fn generated(&self) -> usize {
        self.generated
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[UnitWarning] {
        &self.warnings
    }

    /// Take the recorded warnings, leaving none behind
    pub fn take_warnings(&mut self) -> Vec<UnitWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn load_page(&mut self, page: RawPage) {
        let number = page.number;
        tracing::debug!("Extracting page {} of {}", number, self.doc_id);

        match page.text {
            Ok(Some(text)) => {
                let units = ParagraphNormalizer::paragraphs(&self.doc_id, number, &text);
                self.pending
                    .extend(units.map(|unit| IndexAction::paragraph(&self.index, unit)));
            }
            Ok(None) => {}
            Err(e) => self.warn(number, UnitKind::Paragraph, e),
        }

        match page.tables {
            Ok(tables) => {
                for (table_index, raw) in tables.iter().enumerate() {
                    let unit = TableNormalizer::normalize(&self.doc_id, number, table_index, raw);
                    self.pending.push_back(IndexAction::table(&self.index, unit));
                }
            }
            Err(e) => self.warn(number, UnitKind::Table, e),
        }

        match page.images {
            Ok(images) => {
                for (image_index, descriptor) in images.iter().enumerate() {
                    let unit = ImageUnit {
                        doc_id: self.doc_id.clone(),
                        page: number,
                        image_index,
                        metadata: normalize_image_metadata(descriptor),
                        caption: String::new(),
                    };
                    self.pending.push_back(IndexAction::image(&self.index, unit));
                }
            }
            Err(e) => self.warn(number, UnitKind::Image, e),
        }
    }

    fn warn(&mut self, page: u32, unit: UnitKind, error: impl std::fmt::Display) {
        let message = error.to_string();
        tracing::warn!(
            "Skipping {}s on page {} of {}: {}",
            unit, page, self.doc_id, message
        );
        self.warnings.push(UnitWarning {
            page,
            unit,
            message,
        });
    }
}

impl<S: PageSource> Iterator for Actions<S> {
    type Item = IndexAction;

    fn next(&mut self) -> Option<IndexAction> {
        loop {
            if let Some(action) = self.pending.pop_front() {
                self.generated += 1;
                return Some(action);
            }
            if self.next_page > self.page_count {
                return None;
            }
            let number = self.next_page;
            self.next_page += 1;
            let source = &self.source;
            let page = panic::catch_unwind(AssertUnwindSafe(|| {
                run_blocking(|| source.page(number))
            }))
            .unwrap_or_else(|_| RawPage::failed(number, "page parser panicked"));
            self.load_page(page);
        }
    }
}

/// Run blocking page work, handing this worker's other tasks to the rest of a
/// multi-threaded runtime first
///
/// Current-thread runtimes and plain threads run `f` directly.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}
