//! # Index Error Types
//!
//! Failures while building an index or moving it to and from its libsql file.
//! Embedding failures surface as capability errors; everything else is a
//! persistence failure of the collection.

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// The embedding capability failed or returned unusable vectors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// LibSQL error
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Metadata could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Persisted data is inconsistent
    #[error("Data error: {0}")]
    Data(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<IndexError> for CrateError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Embedding(message) => CrateError::Embedding(message),
            other => CrateError::IndexPersistence(other.to_string()),
        }
    }
}
