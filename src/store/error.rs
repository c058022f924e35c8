//! Error types for the store module

use crate::error::Error as CrateError;
use crate::index::IndexError;
use thiserror::Error;

/// Error type for collection storage
#[derive(Debug, Error)]
pub enum StoreError {
    /// The name cannot be used as a collection directory
    #[error("Invalid collection name '{0}': use letters, digits, '-' and '_', starting with a letter or digit")]
    InvalidName(String),

    /// No collection with this name exists
    #[error("Collection not found: {0}")]
    NotFound(String),

    /// The manifest was written by an incompatible version
    #[error("Unsupported index format version {0}")]
    UnsupportedFormat(u32),

    /// The persisted index does not match its manifest
    #[error("Corrupt collection {name}: {message}")]
    Corrupt { name: String, message: String },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest encoding error
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Index database error
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl From<StoreError> for CrateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidName(_) => CrateError::Validation(err.to_string()),
            StoreError::NotFound(name) => CrateError::CollectionNotFound(name),
            StoreError::Index(index) => index.into(),
            other => CrateError::IndexPersistence(other.to_string()),
        }
    }
}
