//! Error types for the archivist crate

use std::time::Duration;

use thiserror::Error;

/// Result type for archivist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for archivist operations
///
/// Structural failures surface here directly. Per-item failures inside a batch
/// (one unreachable page, one broken audio file) are reported in the batch
/// outcome instead and only reach this type when a single-item operation fails.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or empty required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation targets a collection that does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// The ingested file extension is not recognized
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Navigation or rendering failure while crawling
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// The crawler exceeded its navigation bound
    #[error("Crawl timed out after {0:?}")]
    CrawlTimeout(Duration),

    /// Remote content could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Audio could not be transcribed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The index could not be serialized, deserialized or swapped into place
    #[error("Index persistence error: {0}")]
    IndexPersistence(String),

    /// The embedding capability failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The completion capability failed
    #[error("Completion error: {0}")]
    Completion(String),
}
