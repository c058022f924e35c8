//! Error types for the search module

use thiserror::Error;

use crate::error::Error as CrateError;

/// Errors that can occur during retrieval and answer generation
#[derive(Debug, Error)]
pub enum SearchError {
    /// The prompt was blank
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    /// Error occurred during query embedding
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The query embedding does not fit the index
    #[error("Query has {query} dimensions, index has {index}")]
    DimensionMismatch { query: usize, index: usize },

    /// Error occurred during answer generation
    #[error("Completion error: {0}")]
    Completion(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyPrompt => CrateError::Validation(err.to_string()),
            SearchError::Embedding(_) | SearchError::DimensionMismatch { .. } => {
                CrateError::Embedding(err.to_string())
            }
            SearchError::Completion(message) => CrateError::Completion(message),
        }
    }
}
