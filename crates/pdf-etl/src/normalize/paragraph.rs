//! Paragraph normalization
//!
//! Page text is split on every `"\n\n"`; each non-empty, trimmed segment
//! becomes one paragraph unit. A line holding only spaces is not a break.

use crate::types::ParagraphUnit;

/// Paragraph boundary in extracted page text
const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits page text into paragraph units
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphNormalizer;

impl ParagraphNormalizer {
    /// Paragraph texts in order of appearance
    pub fn split(text: &str) -> impl Iterator<Item = &str> + '_ {
        text.split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
    }

    /// Paragraph units for one page
    ///
    /// The iterator borrows the text, so calling this again on the same page
    /// restarts the sequence with identical units.
    pub fn paragraphs<'a>(
        doc_id: &'a str,
        page: u32,
        text: &'a str,
    ) -> impl Iterator<Item = ParagraphUnit> + 'a {
        Self::split(text)
            .enumerate()
            .map(move |(paragraph_index, text)| ParagraphUnit {
                doc_id: doc_id.to_string(),
                page,
                paragraph_index,
                text: text.to_string(),
            })
    }
}
