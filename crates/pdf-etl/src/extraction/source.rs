//! Page source abstraction
//!
//! A page source hands out raw page content one page at a time. Each part of
//! a page carries its own result so a failure in one part leaves the others
//! usable.

use crate::error::{Error, Result};
use crate::normalize::{RawTable, RawValue};

/// Raw content of one page
#[derive(Debug)]
pub struct RawPage {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page text; `None` when the page has none
    pub text: Result<Option<String>>,
    /// Raw grids in detection order
    pub tables: Result<Vec<RawTable>>,
    /// Raw image descriptors in drawing order
    pub images: Result<Vec<RawValue>>,
}

impl RawPage {
    /// Page whose every part failed with the same message
    pub fn failed(number: u32, message: impl Into<String>) -> Self {
        let message = message.into();
        let error = || Error::extraction(number, message.clone());
        Self {
            number,
            text: Err(error()),
            tables: Err(error()),
            images: Err(error()),
        }
    }
}

/// Trait for anything that yields pages of a document
///
/// Implementations:
/// - `PdfExtractor`: PDF files via lopdf
/// - `StaticSource`: pre-extracted content held in memory
pub trait PageSource {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Raw content of page `number` (1-indexed)
    fn page(&self, number: u32) -> RawPage;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page(&self, number: u32) -> RawPage {
        (**self).page(number)
    }
}

/// Pre-extracted content for one page of a [`StaticSource`]
#[derive(Debug, Clone)]
pub struct StaticPage {
    pub text: Option<String>,
    /// `Err` holds the message reported for a failed detection
    pub tables: std::result::Result<Vec<RawTable>, String>,
    pub images: std::result::Result<Vec<RawValue>, String>,
}

impl Default for StaticPage {
    fn default() -> Self {
        Self {
            text: None,
            tables: Ok(Vec::new()),
            images: Ok(Vec::new()),
        }
    }
}

impl StaticPage {
    /// Page with text only
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Add a raw table
    pub fn with_table(mut self, table: RawTable) -> Self {
        if let Ok(tables) = &mut self.tables {
            tables.push(table);
        }
        self
    }

    /// Add a raw image descriptor
    pub fn with_image(mut self, image: RawValue) -> Self {
        if let Ok(images) = &mut self.images {
            images.push(image);
        }
        self
    }

    /// Make table detection fail on this page
    pub fn with_table_error(mut self, message: impl Into<String>) -> Self {
        self.tables = Err(message.into());
        self
    }

    /// Make image detection fail on this page
    pub fn with_image_error(mut self, message: impl Into<String>) -> Self {
        self.images = Err(message.into());
        self
    }
}

/// In-memory page source
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pages: Vec<StaticPage>,
}

impl StaticSource {
    /// Source over the given pages, first entry is page 1
    pub fn new(pages: Vec<StaticPage>) -> Self {
        Self { pages }
    }
}

impl PageSource for StaticSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> RawPage {
        let Some(page) = number
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
        else {
            return RawPage::failed(number, "page out of range");
        };

        RawPage {
            number,
            text: Ok(page.text.clone()),
            tables: page
                .tables
                .clone()
                .map_err(|msg| Error::extraction(number, msg)),
            images: page
                .images
                .clone()
                .map_err(|msg| Error::extraction(number, msg)),
        }
    }
}
