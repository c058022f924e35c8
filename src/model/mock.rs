//! # Deterministic Models
//!
//! Capability implementations that need no network access. They are used by the
//! test suites and are handy for exercising the pipeline offline.
//!
//! - `MockCompletionModel` answers with a preset text, or echoes the context
//!   documents it was given
//! - `HashEmbeddingModel` embeds text as a normalized bag of hashed words, so
//!   texts sharing words land close together
//! - `MockTranscriber` returns a preset text or the audio bytes read as UTF-8,
//!   and can be told to fail on marked inputs

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
    one_or_many::OneOrMany,
};
use tokio::sync::Mutex;

use super::transcription::{AudioClip, Transcriber, TranscriptionError};

/// A completion model returning a preset answer
///
/// Without a preset it echoes the text of the context documents attached to the
/// request, one per line.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    response: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a mock that echoes its context documents
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text the mock model should return
    pub async fn set_text_response(&self, text: &str) {
        let mut guard = self.response.lock().await;
        *guard = Some(text.to_string());
    }

    /// Number of completion requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let preset = self.response.lock().await.clone();
        let text = preset.unwrap_or_else(|| {
            completion_request
                .documents
                .iter()
                .map(|document| document.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        });

        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&text)),
            raw_response: text,
        })
    }
}

/// Bag-of-words embedder hashing each lowercase word into a fixed bucket
#[derive(Debug, Clone)]
pub struct HashEmbeddingModel {
    ndims: usize,
    calls: Arc<AtomicUsize>,
}

impl HashEmbeddingModel {
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims: ndims.max(1),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `embed_texts` batches received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.ndims as u64) as usize;
            vec[bucket] += 1.0;
        }

        let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vec.iter_mut().for_each(|v| *v /= norm);
        }
        vec
    }
}

impl Default for HashEmbeddingModel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EmbeddingModel for HashEmbeddingModel {
    const MAX_DOCUMENTS: usize = 16;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .into_iter()
            .map(|text| Embedding {
                vec: self.embed(&text),
                document: text,
            })
            .collect())
    }
}

/// A transcriber for tests
#[derive(Debug, Clone, Default)]
pub struct MockTranscriber {
    text: Option<String>,
    fail_marker: Option<String>,
}

impl MockTranscriber {
    /// Always transcribe to `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            fail_marker: None,
        }
    }

    /// Transcribe audio by reading its bytes as UTF-8
    pub fn echo() -> Self {
        Self::default()
    }

    /// Fail on any clip whose bytes contain `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }
}

impl Transcriber for MockTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError> {
        let content = String::from_utf8_lossy(&clip.bytes).to_string();
        if let Some(marker) = &self.fail_marker {
            if content.contains(marker.as_str()) {
                return Err(TranscriptionError::Other(format!(
                    "cannot decode {}",
                    clip.filename
                )));
            }
        }

        let text = self.text.clone().unwrap_or(content);
        if text.trim().is_empty() {
            return Err(TranscriptionError::Empty);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_hash_embeddings_are_deterministic_and_normalized() {
        let model = HashEmbeddingModel::new(32);
        let first = model
            .embed_texts(vec!["Hello world".to_string()])
            .await
            .unwrap();
        let second = model
            .embed_texts(vec!["hello WORLD".to_string()])
            .await
            .unwrap();

        assert_eq!(first[0].vec, second[0].vec);
        let norm: f64 = first[0].vec.iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-9);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_hash_embeddings_reflect_shared_words() {
        let model = HashEmbeddingModel::default();
        let embeddings = model
            .embed_texts(vec![
                "rust borrow checker".to_string(),
                "the borrow checker in rust".to_string(),
                "banana bread recipe".to_string(),
            ])
            .await
            .unwrap();

        let related = cosine(&embeddings[0].vec, &embeddings[1].vec);
        let unrelated = cosine(&embeddings[0].vec, &embeddings[2].vec);
        assert!(related > unrelated);
    }

    #[tokio::test]
    async fn test_mock_transcriber_modes() {
        let fixed = MockTranscriber::new("fixed");
        assert_eq!(
            fixed.transcribe(AudioClip::new(b"x".to_vec(), "a.wav")).await.unwrap(),
            "fixed"
        );

        let echo = MockTranscriber::echo().failing_on("corrupt");
        assert_eq!(
            echo.transcribe(AudioClip::new(b"spoken".to_vec(), "a.wav"))
                .await
                .unwrap(),
            "spoken"
        );
        assert!(
            echo.transcribe(AudioClip::new(b"corrupt data".to_vec(), "b.wav"))
                .await
                .is_err()
        );
    }
}
