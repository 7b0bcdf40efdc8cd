//! # askpdf CLI
//!
//! Commands for indexing PDFs and asking questions about them.
//!
//! ## Usage
//!
//! ```bash
//! askpdf --config ./config/askpdf.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `askpdf init` | Create the store root and database schema |
//! | `askpdf ingest <pdf>` | Extract, chunk, embed, and index a PDF |
//! | `askpdf ask <document> "<question>"` | Answer a question from a document's passages |
//! | `askpdf collections` | List indexed collections |
//! | `askpdf reset` | Wipe the store root (every collection) |
//!
//! Credentials come from the environment: `OPENAI_API_KEY`, and
//! `OPENAI_PROJECT_ID` for project-scoped (`sk-proj-...`) keys.

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use askpdf::completion::OpenAiCompletion;
use askpdf::config;
use askpdf::credentials::Credential;
use askpdf::embedding::OpenAiEmbedder;
use askpdf::{ingest, query, store};

/// Ask questions about a PDF, answered from retrieved passages.
#[derive(Parser)]
#[command(
    name = "askpdf",
    about = "Index a PDF into a local vector store and ask questions about it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/askpdf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store root and database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Extract, chunk, embed, and index a PDF.
    ///
    /// The collection is keyed by the file's name (lower-cased, spaces
    /// replaced with underscores, extension dropped). Re-ingesting a
    /// name whose collection already has content skips embedding.
    Ingest {
        /// Path to the PDF file.
        pdf: PathBuf,

        /// Display name overriding the file's name for identity
        /// derivation.
        #[arg(long)]
        name: Option<String>,
    },

    /// Answer a question from a document's retrieved passages.
    Ask {
        /// Document name (same as given at ingest; a path or `.pdf`
        /// suffix is tolerated).
        document: String,

        /// The question to answer.
        question: String,
    },

    /// List indexed collections with chunk counts.
    Collections,

    /// Wipe the store root, destroying every collection.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = store::Store::open(&cfg.store.root).await?;
            println!("Store initialized at {}", store.root().display());
            store.close().await;
        }
        Commands::Ingest { pdf, name } => {
            let credential = gated_credential()?;
            let embedder = OpenAiEmbedder::new(&cfg.openai, credential)?;
            let store = store::Store::open(&cfg.store.root).await?;
            ingest::run_ingest(&cfg, &store, &embedder, &pdf, name.as_deref()).await?;
            store.close().await;
        }
        Commands::Ask { document, question } => {
            if question.trim().is_empty() {
                bail!("question is empty");
            }
            let credential = gated_credential()?;
            let embedder = OpenAiEmbedder::new(&cfg.openai, credential.clone())?;
            let completion = OpenAiCompletion::new(&cfg.openai, credential)?;
            let store = store::Store::open(&cfg.store.root).await?;

            let name = store::collection_name(&document);
            let handle = store.get_or_create(&name, &[], &embedder).await?;
            if handle.chunk_count().await? == 0 {
                eprintln!(
                    "Warning: collection '{}' is empty; answering without context",
                    name
                );
            }

            let answer =
                query::answer(&handle, &question, &embedder, &completion, cfg.retrieval.top_k)
                    .await?;
            println!("{}", answer);
            store.close().await;
        }
        Commands::Collections => {
            let store = store::Store::open(&cfg.store.root).await?;
            let collections = store.list_collections().await?;
            if collections.is_empty() {
                println!("No collections.");
            } else {
                for info in collections {
                    println!(
                        "{}  chunks: {}  model: {}",
                        info.name, info.chunk_count, info.model
                    );
                }
            }
            store.close().await;
        }
        Commands::Reset => {
            store::reset_root(&cfg.store.root)?;
            println!("Store root reset at {}", cfg.store.root.display());
        }
    }

    Ok(())
}

/// Resolve the credential from the environment and gate the remote
/// action on the advisory checks (missing key, project-scoped key
/// without a project id).
fn gated_credential() -> anyhow::Result<Credential> {
    let credential = Credential::from_env();
    if let Err(reason) = credential.check() {
        bail!("{}", reason);
    }
    Ok(credential)
}
