//! # Archivist - Named Knowledge Collections with RAG
//!
//! This crate ingests heterogeneous sources into named, persistent vector-index
//! collections and answers natural-language questions against them with
//! Retrieval-Augmented Generation.
//!
//! ## Features
//!
//! - Single-page link discovery with spider, optionally rendering with Chrome
//! - Normalization of raw text, web pages and audio transcripts into documents
//! - Overlapping passage chunking with boundary-aware split points
//! - Vector indexing persisted to LibSQL, swapped in atomically
//! - Cosine top-k retrieval and grounded answer generation
//! - Rate-limited completion, embedding and transcription clients
//!
//! ## Example
//!
//! ```rust,no_run
//! use archivist::prelude::*;
//! use archivist::model::{GeminiClient, WhisperTranscriber};
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::new_gemini_from_env()?;
//!     let transcriber = WhisperTranscriber::from_env()?;
//!     let manager = CollectionManager::new(ArchivistConfig::default(), client, transcriber).await?;
//!
//!     let request = IngestRequest {
//!         text: vec!["The office closes at 5pm on Fridays.".to_string()],
//!         urls: vec!["https://example.com/about".to_string()],
//!         audio: vec![],
//!     };
//!     let report = manager.create_collection("office-notes", Some(request)).await?;
//!     println!("indexed {} documents", report.manifest.document_count);
//!
//!     let answer = manager.query("office-notes", "When does the office close on Friday?").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

mod error;

pub mod collection;
pub mod config;
pub mod crawler;
pub mod index;
pub mod ingest;
pub mod model;
pub mod processor;
pub mod search;
pub mod store;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::collection::{BuildReport, CollectionManager};
    pub use crate::config::ArchivistConfig;
    pub use crate::crawler::Crawler;
    pub use crate::error::{Error, Result};
    pub use crate::ingest::{AudioSource, Document, IngestRequest};
    pub use crate::search::{Answer, SearchResult};
}
