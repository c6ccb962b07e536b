//! Content normalizers: page text, raw grids and image descriptors into units

mod image;
mod paragraph;
mod table;
mod value;

pub use image::{normalize_image_metadata, BINARY_PAYLOAD_KEYS, MAX_DEPTH};
pub use paragraph::ParagraphNormalizer;
pub use table::{unique_headers, RawTable, TableNormalizer};
pub use value::RawValue;

pub(crate) use value::dictionary_entries;
