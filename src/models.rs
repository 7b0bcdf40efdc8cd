//! Core data types flowing through the ingestion and query pipeline.

/// Text extracted from a single PDF page, before chunking.
///
/// `text` may be empty when a page yields no extractable text; that is
/// a degradation, not an error.
#[derive(Debug, Clone)]
pub struct PageText {
    pub text: String,
    /// 1-based page number in the source document.
    pub page_number: u32,
}

/// A bounded span of document text tagged with its source page.
///
/// Chunks are produced once per document ingestion and are immutable
/// afterwards; the collection store owns them from that point on.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    /// 1-based page the text was split from.
    pub page_number: u32,
    /// Position in the overall chunk sequence for the document.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, stored alongside the chunk.
    pub hash: String,
}

/// A chunk retrieved by similarity search, in search-ranked order.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub page_number: u32,
    pub score: f64,
}
