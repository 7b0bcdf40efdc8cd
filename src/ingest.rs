//! Ingestion orchestration: extract → chunk → get-or-create collection.

use std::path::Path;

use anyhow::{Context, Result};

use crate::chunk::chunk_pages;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::extract::extract_pages;
use crate::store::{collection_name, CollectionHandle, Store};

/// Ingest one PDF into its collection.
///
/// The collection identity is derived from `name_override` when given,
/// otherwise from the file's name. Re-ingesting a document whose
/// collection already has content does not re-embed: existing content
/// is trusted as-is. Prints a status ledger and returns the handle.
pub async fn run_ingest(
    config: &Config,
    store: &Store,
    embedder: &dyn Embedder,
    path: &Path,
    name_override: Option<&str>,
) -> Result<CollectionHandle> {
    let display = match name_override {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|s| s.to_str())
            .context("PDF path has no usable file name")?
            .to_string(),
    };

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let pages = extract_pages(&bytes)?;
    let chunks = chunk_pages(&pages, config.chunking.chunk_size, config.chunking.overlap);

    let name = collection_name(&display);
    let existing = store.collection_chunk_count(&name).await?;
    let handle = store.get_or_create(&name, &chunks, embedder).await?;

    println!("ingest {}", display);
    println!("  pages: {}", pages.len());
    println!("  chunks: {}", chunks.len());
    println!("  collection: {}", name);
    if existing > 0 {
        println!("  reused existing collection ({} chunks, not re-embedded)", existing);
    } else if chunks.is_empty() {
        println!("  no extractable text; collection left empty");
    } else {
        println!("  embedded: {}", chunks.len());
    }
    println!("ok");

    Ok(handle)
}
