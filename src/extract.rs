//! Per-page PDF text extraction.
//!
//! Wraps `pdf-extract`. A page that yields no extractable text degrades
//! to an empty string rather than an error; only a document that cannot
//! be parsed at all is fatal.

use anyhow::{Context, Result};

use crate::models::PageText;

/// Extract per-page text from raw PDF bytes.
///
/// Pages come back in document order with 1-based page numbers. An
/// all-image or otherwise textless page is an empty-text entry, so a
/// scanned document produces pages of empty strings, not an error.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .context("PDF extraction failed (is this a valid PDF?)")?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            text,
            page_number: (i + 1) as u32,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        assert!(extract_pages(b"not a pdf").is_err());
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(extract_pages(b"").is_err());
    }
}
