//! Page extraction: raw text, grids and image descriptors per page

mod pdf;
mod source;
mod tables;

pub use pdf::PdfExtractor;
pub use source::{PageSource, RawPage, StaticPage, StaticSource};
pub use tables::detect_text_grids;
