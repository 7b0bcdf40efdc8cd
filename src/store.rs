//! SQLite-backed collection store.
//!
//! One database file (`index.db`) under a single store root directory
//! holds every collection: a named, durable set of (chunk, vector) rows
//! keyed by document identity. The root is created lazily on first
//! open. A [`Store`] is constructed once per process by the caller and
//! passed down explicitly; it is never a hidden global.
//!
//! Corruption recovery is the blunt `ResetAndRetryOnce` strategy: if the
//! database cannot be opened and migrated, the entire root is deleted
//! and recreated empty, and the open is retried exactly once. This
//! wipes unrelated collections too; the store is a local cache, not a
//! system of record, and simplicity wins over isolation here. Opening a
//! collection that does not exist yet is the ordinary empty path, never
//! a reset trigger.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::embedding::{self, Embedder};
use crate::models::{Chunk, RetrievedChunk};

const STORE_DB_FILE: &str = "index.db";

/// Derive the collection identity from a document's display name:
/// strip any path, drop the extension, replace spaces with underscores,
/// lower-case. Two uploads with the same derived name are the same
/// logical document and share one collection.
pub fn collection_name(display_name: &str) -> String {
    let stem = Path::new(display_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(display_name);
    stem.replace(' ', "_").to_lowercase()
}

/// Handle to the shared store root. Owns the connection pool for the
/// process lifetime.
pub struct Store {
    pool: SqlitePool,
    root: PathBuf,
}

impl Store {
    /// Open the store at `root`, applying `ResetAndRetryOnce` recovery:
    /// on any open/migrate failure the root is wiped and recreated, then
    /// the open is retried once against the now-certainly-empty store.
    /// A second failure surfaces to the caller.
    pub async fn open(root: &Path) -> Result<Self> {
        let pool = match Self::connect(root).await {
            Ok(pool) => pool,
            Err(e) => {
                eprintln!(
                    "Warning: vector store at {} unreadable ({:#}); resetting store root",
                    root.display(),
                    e
                );
                reset_root(root)?;
                Self::connect(root)
                    .await
                    .context("vector store unreadable after reset")?
            }
        };

        Ok(Self {
            pool,
            root: root.to_path_buf(),
        })
    }

    async fn connect(root: &Path) -> Result<SqlitePool> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create store root {}", root.display()))?;

        let db_path = root.join(STORE_DB_FILE);
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        migrate(&pool).await?;
        Ok(pool)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Open the collection named `name`, populating it if empty.
    ///
    /// First access creates the collection metadata. If the collection
    /// holds zero chunks, all provided chunks are embedded and the
    /// (chunk, vector) rows are inserted in one transaction, so callers
    /// never observe a partially ingested collection. A non-empty
    /// collection is trusted as-is: nothing is re-embedded and the
    /// provided chunks are ignored.
    pub async fn get_or_create(
        &self,
        name: &str,
        chunks: &[Chunk],
        embedder: &dyn Embedder,
    ) -> Result<CollectionHandle> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO collections (name, model, created_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(embedder.model_name())
        .bind(now)
        .execute(&self.pool)
        .await?;

        // Vectors from different models are not comparable; refuse to
        // mix them within one collection.
        let model: String = sqlx::query_scalar("SELECT model FROM collections WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        if model != embedder.model_name() {
            bail!(
                "collection '{}' was embedded with model '{}', not '{}'",
                name,
                model,
                embedder.model_name()
            );
        }

        let count = chunk_count(&self.pool, name).await?;
        if count == 0 && !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed(&texts).await?;

            let mut tx = self.pool.begin().await?;
            for (chunk, vec) in chunks.iter().zip(vectors.iter()) {
                sqlx::query(
                    "INSERT INTO chunks (id, collection, chunk_index, page, text, hash)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&chunk.id)
                .bind(name)
                .bind(chunk.chunk_index)
                .bind(chunk.page_number as i64)
                .bind(&chunk.text)
                .bind(&chunk.hash)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    "INSERT INTO chunk_vectors (chunk_id, collection, embedding)
                     VALUES (?, ?, ?)",
                )
                .bind(&chunk.id)
                .bind(name)
                .bind(embedding::vec_to_blob(vec))
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
        }

        Ok(CollectionHandle {
            pool: self.pool.clone(),
            name: name.to_string(),
            model,
        })
    }

    /// Chunk cardinality for a collection; 0 when the collection does
    /// not exist yet.
    pub async fn collection_chunk_count(&self, name: &str) -> Result<i64> {
        chunk_count(&self.pool, name).await
    }

    /// List all collections with their chunk counts, name order.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT col.name, col.model,
                   (SELECT COUNT(*) FROM chunks c WHERE c.collection = col.name) AS chunk_count
            FROM collections col
            ORDER BY col.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CollectionInfo {
                name: row.get("name"),
                model: row.get("model"),
                chunk_count: row.get("chunk_count"),
            })
            .collect())
    }
}

/// Summary row for `askpdf collections`.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub name: String,
    pub model: String,
    pub chunk_count: i64,
}

/// Destroy the store root (recursive delete, ignore missing) and
/// recreate it empty. Every collection is lost; this is the recovery
/// primitive, also exposed as `askpdf reset`.
pub fn reset_root(root: &Path) -> Result<()> {
    if let Err(e) = std::fs::remove_dir_all(root) {
        if e.kind() != std::io::ErrorKind::NotFound {
            // Carry on; the create below fails loudly if the path is
            // genuinely unusable.
            eprintln!("Warning: could not remove {}: {}", root.display(), e);
        }
    }
    std::fs::create_dir_all(root)
        .with_context(|| format!("failed to recreate store root {}", root.display()))
}

async fn chunk_count(pool: &SqlitePool, collection: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
        .bind(collection)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Handle bound to one collection and the embedding model it was opened
/// with. Similarity searches must use a query vector from that model.
#[derive(Clone)]
pub struct CollectionHandle {
    pool: SqlitePool,
    name: String,
    model: String,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chunk_count(&self) -> Result<i64> {
        chunk_count(&self.pool, &self.name).await
    }

    /// Top-k nearest chunks to `query_vec` by cosine similarity,
    /// best first. Fewer than `k` chunks in the collection is not an
    /// error; an empty collection returns an empty list.
    pub async fn similarity_search(
        &self,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.text, c.page, c.chunk_index, v.embedding
            FROM chunk_vectors v
            JOIN chunks c ON c.id = v.chunk_id
            WHERE v.collection = ?
            "#,
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<(i64, RetrievedChunk)> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = embedding::blob_to_vec(&blob);
                let score = embedding::cosine_similarity(query_vec, &vec) as f64;
                let page: i64 = row.get("page");
                let chunk_index: i64 = row.get("chunk_index");
                (
                    chunk_index,
                    RetrievedChunk {
                        text: row.get("text"),
                        page_number: page as u32,
                        score,
                    },
                )
            })
            .collect();

        // Score desc, chunk order as tiebreak (deterministic ranking).
        candidates.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        candidates.truncate(k);

        Ok(candidates.into_iter().map(|(_, c)| c).collect())
    }
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            page INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            UNIQUE(collection, chunk_index),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            chunk_id TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (chunk_id) REFERENCES chunks(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chunk_vectors_collection ON chunk_vectors(collection)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_normalizes() {
        assert_eq!(collection_name("My Report.pdf"), "my_report");
        assert_eq!(collection_name("Annual Review 2026.PDF"), "annual_review_2026");
    }

    #[test]
    fn test_collection_name_strips_path() {
        assert_eq!(collection_name("docs/My Report.pdf"), "my_report");
        assert_eq!(collection_name("/tmp/up loads/Paper.pdf"), "paper");
    }

    #[test]
    fn test_collection_name_without_extension() {
        assert_eq!(collection_name("README"), "readme");
    }

    #[test]
    fn test_same_filename_same_identity() {
        // Identity is by filename, not content: both resolve to the
        // same collection.
        assert_eq!(
            collection_name("a/report.pdf"),
            collection_name("b/report.pdf")
        );
    }
}
