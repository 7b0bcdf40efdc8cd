//! Recursive size-bounded text chunker.
//!
//! Splits each page's text into [`Chunk`]s of at most `chunk_size`
//! characters, cutting preferentially at natural boundaries (paragraph
//! break, then line break, then word) before falling back to a hard cut.
//! Consecutive chunks from the same page share exactly `overlap`
//! characters so that a passage straddling a cut is still retrievable.
//!
//! Each chunk receives a random UUID plus a SHA-256 hash of its text,
//! and carries the page number of the page it was split from.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, PageText};

/// Split extracted pages into an ordered chunk sequence.
///
/// Pages are processed in order; `chunk_index` is contiguous across the
/// whole document starting at 0. Pages with no extractable text
/// contribute nothing, so an all-empty document yields an empty
/// sequence. Pure transformation, no side effects.
pub fn chunk_pages(pages: &[PageText], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut chunk_index: i64 = 0;

    for page in pages {
        for piece in split_text(&page.text, chunk_size, overlap) {
            chunks.push(make_chunk(page.page_number, chunk_index, &piece));
            chunk_index += 1;
        }
    }

    chunks
}

/// Split one text into pieces of at most `chunk_size` characters with
/// `overlap` characters shared between consecutive pieces.
///
/// Sizes are in characters, not bytes, so multi-byte text never splits
/// inside a code point. Whitespace-only pieces are dropped.
fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < chunk_size);

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut pieces = Vec::new();
    let mut start = 0usize;

    while start < total {
        let window_end = (start + chunk_size).min(total);
        let cut = if window_end < total {
            find_cut(&chars, start, window_end, overlap)
        } else {
            window_end
        };

        let piece: String = chars[start..cut].iter().collect();
        if !piece.trim().is_empty() {
            pieces.push(piece);
        }

        if cut >= total {
            break;
        }
        start = cut - overlap;
    }

    pieces
}

/// Pick the cut position for a window that does not reach the end of the
/// text. Prefers the position just after the last paragraph break, then
/// the last line break, then the last space; falls back to the full
/// window. A candidate is only usable if it leaves room for the overlap
/// to step forward (`cut > start + overlap`), otherwise splitting would
/// stall.
fn find_cut(chars: &[char], start: usize, window_end: usize, overlap: usize) -> usize {
    let min_cut = start + overlap + 1;

    // Paragraph break: cut after the "\n\n" pair.
    for i in (start + 1..window_end).rev() {
        if chars[i] == '\n' && chars[i - 1] == '\n' {
            let cut = i + 1;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Line break.
    for i in (start..window_end).rev() {
        if chars[i] == '\n' {
            let cut = i + 1;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Word boundary.
    for i in (start..window_end).rev() {
        if chars[i] == ' ' {
            let cut = i + 1;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Hard cut.
    window_end
}

fn make_chunk(page_number: u32, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        page_number,
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
