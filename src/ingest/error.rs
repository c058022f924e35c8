//! Error types for the ingest module

use crate::error::Error as CrateError;
use crate::model::TranscriptionError;
use thiserror::Error;

/// Error type for document normalization
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request carried no text, no URLs and no audio
    #[error("No text, web urls or audio to ingest")]
    NoInput,

    /// The input produced no text
    #[error("No text content in {0}")]
    EmptyDocument(String),

    /// A text file was not valid UTF-8
    #[error("Could not decode {0} as UTF-8")]
    Decode(String),

    /// The file extension is not recognized
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// A web page or audio file could not be retrieved
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// Audio could not be transcribed
    #[error("Failed to transcribe {source_name}: {error}")]
    Transcription {
        source_name: String,
        #[source]
        error: TranscriptionError,
    },

    /// HTTP client setup error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Temporary storage error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl IngestError {
    /// Rejection of `filename`, named by its extension when it has one
    pub(crate) fn unsupported(filename: &str, extension: &str) -> Self {
        if extension.is_empty() {
            IngestError::UnsupportedFileType(filename.to_string())
        } else {
            IngestError::UnsupportedFileType(format!(".{}", extension))
        }
    }
}

impl From<IngestError> for CrateError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoInput | IngestError::EmptyDocument(_) | IngestError::Decode(_) => {
                CrateError::Validation(err.to_string())
            }
            IngestError::UnsupportedFileType(ext) => CrateError::UnsupportedFileType(ext),
            IngestError::Fetch { .. } | IngestError::Http(_) => CrateError::Fetch(err.to_string()),
            IngestError::Transcription { .. } => CrateError::Transcription(err.to_string()),
            IngestError::Io(_) | IngestError::Other(_) => CrateError::Fetch(err.to_string()),
        }
    }
}
