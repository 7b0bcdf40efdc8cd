//! # askpdf
//!
//! Ask questions about a PDF from the command line. Documents are
//! chunked, embedded, and indexed into a per-document vector collection
//! on durable local storage; questions are answered by a hosted
//! completion model from the top-k retrieved passages.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────┐   ┌─────────┐   ┌────────────┐   ┌───────────┐
//! │  PDF    │──▶│ Chunker │──▶│ Collection │──▶│ Retrieval │──▶ answer
//! │ extract │   │ 512/64  │   │   store    │   │  + prompt │
//! └─────────┘   └─────────┘   │  (SQLite)  │   └───────────┘
//!                             └────────────┘
//! ```
//!
//! Ingestion embeds every chunk once per document identity; asking
//! embeds the question, retrieves the 4 nearest chunks, and sends one
//! bounded prompt to the completion model.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`credentials`] | API key + project id handling |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`chunk`] | Size-bounded overlapping chunker |
//! | [`embedding`] | Embedding provider trait + OpenAI implementation |
//! | [`completion`] | Chat completion trait + OpenAI implementation |
//! | [`store`] | Durable collection store with reset-and-retry recovery |
//! | [`query`] | Context assembly, prompt construction, answering |
//! | [`ingest`] | Extract → chunk → index orchestration |

pub mod chunk;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod query;
pub mod store;
