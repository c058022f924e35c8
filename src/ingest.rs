//! # Document Ingestion Module
//!
//! This module turns heterogeneous inputs into uniform `Document`s: raw text,
//! web pages fetched over HTTP and audio transcribed to text. It is the stage
//! before indexing in the pipeline.
//!
//! ## Key Components
//!
//! - `DocumentNormalizer`: Converts text, web and audio inputs into documents
//! - `IngestRequest`: A batch of inputs for one collection
//! - `BatchOutcome`: The documents a batch produced plus its isolated failures
//! - `FileKind`: Extension dispatch for uploaded files
//!
//! ## Failure Isolation
//!
//! Within a batch every item yields its own `Result`. Failed items are logged
//! and collected in `BatchOutcome::failures`; they never abort their siblings.
//! Only a request without any input is rejected up front.

mod audio;
mod document;
mod error;
mod file_kind;
mod web;

pub use audio::AudioSource;
pub use document::{AUDIO_URL, Document, FILENAME, SOURCE_URL, TITLE};
pub use error::IngestError;
pub use file_kind::{AudioFormat, FileKind};
pub use web::{extract_text, extract_title};

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use futures::future;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::model::{AudioClip, Transcriber};

/// A batch of inputs to normalize
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Raw text entries, one document each
    #[serde(default)]
    pub text: Vec<String>,

    /// Web pages to fetch, one document each
    #[serde(default)]
    pub urls: Vec<String>,

    /// Audio to transcribe, one document each
    #[serde(default)]
    pub audio: Vec<AudioSource>,
}

impl IngestRequest {
    /// Whether the request supplies nothing to ingest
    pub fn is_empty(&self) -> bool {
        self.text.iter().all(|text| text.trim().is_empty())
            && self.urls.iter().all(|url| url.trim().is_empty())
            && self.audio.is_empty()
    }
}

/// A single input that failed to normalize
#[derive(Debug)]
pub struct ItemFailure {
    /// URL or file name of the failed input
    pub source: String,

    /// Why it failed
    pub error: IngestError,
}

/// Documents produced by a batch and the inputs that failed
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<ItemFailure>,
}

impl BatchOutcome {
    /// Fold per-item results, keeping input order
    fn collect(results: Vec<(String, Result<Document, IngestError>)>) -> Self {
        results
            .into_iter()
            .fold(Self::default(), |mut outcome, (source, result)| {
                match result {
                    Ok(document) => outcome.documents.push(document),
                    Err(error) => {
                        warn!("Skipping {}: {}", source, error);
                        outcome.failures.push(ItemFailure { source, error });
                    }
                }
                outcome
            })
    }

    fn extend(&mut self, other: BatchOutcome) {
        self.documents.extend(other.documents);
        self.failures.extend(other.failures);
    }
}

/// Configuration for the normalizer
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Maximum number of inputs fetched or transcribed at once
    pub concurrency: usize,

    /// Timeout for each HTTP request
    pub request_timeout: Duration,

    /// User agent for page and audio downloads
    pub user_agent: String,

    /// CSS selectors whose text is dropped from web pages
    pub exclude_selectors: Vec<String>,

    /// Directory for audio downloads while they are buffered
    pub scratch_dir: PathBuf,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            request_timeout: Duration::from_secs(30),
            user_agent: format!("archivist/{}", env!("CARGO_PKG_VERSION")),
            exclude_selectors: vec![
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
                "aside".to_string(),
            ],
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Converts ingestion inputs into documents
#[derive(Debug, Clone)]
pub struct DocumentNormalizer<T: Transcriber> {
    http: reqwest::Client,
    transcriber: T,
    config: NormalizerConfig,
}

impl<T: Transcriber> DocumentNormalizer<T> {
    /// Create a normalizer around the transcription capability
    pub fn new(transcriber: T, config: NormalizerConfig) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            transcriber,
            config,
        })
    }

    /// Normalize every input of the request
    ///
    /// Web documents come first, then text, then audio.
    #[instrument(skip_all, fields(text = request.text.len(), urls = request.urls.len(), audio = request.audio.len()))]
    pub async fn normalize(&self, request: IngestRequest) -> Result<BatchOutcome, IngestError> {
        if request.is_empty() {
            return Err(IngestError::NoInput);
        }

        let mut outcome = self.from_web(&request.urls).await;
        outcome.documents.extend(Self::from_text(request.text));
        outcome.extend(self.from_audio(request.audio).await);

        info!(
            "Normalized {} documents, {} inputs failed",
            outcome.documents.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// One document per non-blank text entry
    pub fn from_text(texts: Vec<String>) -> Vec<Document> {
        texts.into_iter().filter_map(Document::new).collect()
    }

    /// One document per reachable web page
    pub async fn from_web(&self, urls: &[String]) -> BatchOutcome {
        let urls = urls.iter().filter(|url| !url.trim().is_empty());
        let results = self
            .bounded(urls.map(|url| async move {
                let result =
                    web::fetch_page(&self.http, url.trim(), &self.config.exclude_selectors).await;
                (url.clone(), result)
            }))
            .await;
        BatchOutcome::collect(results)
    }

    /// One document per audio input that downloads and transcribes
    pub async fn from_audio(&self, sources: Vec<AudioSource>) -> BatchOutcome {
        let results = self
            .bounded(sources.into_iter().map(|source| async move {
                let name = source.describe().to_string();
                (name, self.transcribe_source(source).await)
            }))
            .await;
        BatchOutcome::collect(results)
    }

    /// Normalize a single uploaded file according to its extension
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn from_file(&self, filename: &str, bytes: Vec<u8>) -> Result<Document, IngestError> {
        match FileKind::from_filename(filename) {
            FileKind::Text => {
                let text =
                    String::from_utf8(bytes).map_err(|_| IngestError::Decode(filename.to_string()))?;
                Ok(Document::new(text)
                    .ok_or_else(|| IngestError::EmptyDocument(filename.to_string()))?
                    .with_metadata(FILENAME, filename))
            }
            FileKind::Audio(_) => {
                self.transcribe_source(AudioSource::Upload {
                    filename: filename.to_string(),
                    bytes,
                })
                .await
            }
            FileKind::Unsupported(extension) => Err(IngestError::unsupported(filename, &extension)),
        }
    }

    async fn transcribe_source(&self, source: AudioSource) -> Result<Document, IngestError> {
        let (clip, key, value) = match source {
            AudioSource::Url(url) => {
                let clip = audio::download(&self.http, url.trim(), &self.config.scratch_dir).await?;
                (clip, AUDIO_URL, url)
            }
            AudioSource::Upload { filename, bytes } => {
                (AudioClip::new(bytes, filename.clone()), FILENAME, filename)
            }
        };

        let text = self
            .transcriber
            .transcribe(clip)
            .await
            .map_err(|error| IngestError::Transcription {
                source_name: value.clone(),
                error,
            })?;

        Ok(Document::new(text)
            .ok_or_else(|| IngestError::EmptyDocument(value.clone()))?
            .with_metadata(key, value))
    }

    /// Run futures with at most `concurrency` in flight, preserving order
    async fn bounded<I, F, R>(&self, tasks: I) -> Vec<R>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = R>,
    {
        let semaphore = Semaphore::new(self.config.concurrency.max(1));
        let semaphore = &semaphore;
        future::join_all(tasks.into_iter().map(|task| async move {
            let _permit = semaphore.acquire().await;
            task.await
        }))
        .await
    }
}
