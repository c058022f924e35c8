//! Speech-to-text capability

use std::future::Future;

use thiserror::Error;

/// Audio bytes handed to a transcriber
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Raw audio bytes
    pub bytes: Vec<u8>,

    /// File name, used by providers to infer the container format
    pub filename: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }
}

/// Error type for transcription
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request
    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    /// The provider returned no text
    #[error("Transcription produced no text")]
    Empty,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Converts audio to text
pub trait Transcriber: Clone + Send + Sync {
    /// Transcribe `clip` into plain text
    fn transcribe(
        &self,
        clip: AudioClip,
    ) -> impl Future<Output = Result<String, TranscriptionError>> + Send;
}
