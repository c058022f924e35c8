//! Error types for the crawler module

use std::time::Duration;

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL was missing
    #[error("Seed URL is empty")]
    EmptySeed,

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The seed URL cannot serve as a link base
    #[error("Unsupported seed URL: {0}")]
    UnsupportedSeed(String),

    /// Navigation failed or produced no page
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The browser session exceeded its bound
    #[error("Crawl timed out after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::EmptySeed => CrateError::Validation(err.to_string()),
            CrawlError::Timeout(bound) => CrateError::CrawlTimeout(bound),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}
