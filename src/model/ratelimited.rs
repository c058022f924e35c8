//! Rate limiting wrappers for the model capabilities
//!
//! Each wrapper waits on a shared `governor` limiter before delegating, so a
//! single quota is honored across every clone of the wrapper.

use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::{
    completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse},
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
};
use tracing::{Instrument, debug_span, info_span};

use super::transcription::{AudioClip, Transcriber, TranscriptionError};

/// Raw provider response wrapped by the rate limiter
pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M: CompletionModel> RateLimitedCompletionModel<M> {
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await?;
        Ok(CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M: EmbeddingModel> RateLimitedEmbeddingModel<M> {
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        self.model
            .embed_texts(texts)
            .instrument(info_span!("embed_texts"))
            .await
    }
}

#[derive(Clone)]
pub struct RateLimitedTranscriber<T: Transcriber> {
    transcriber: T,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<T: Transcriber> RateLimitedTranscriber<T> {
    pub fn new(transcriber: T, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            transcriber,
            limiter: Arc::new(limiter),
        }
    }
}

impl<T: Transcriber> Transcriber for RateLimitedTranscriber<T> {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        self.transcriber
            .transcribe(clip)
            .instrument(info_span!("transcribe"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::MockTranscriber;
    use governor::{Quota, RateLimiter};
    use std::num::NonZeroU32;

    #[tokio::test]
    async fn test_rate_limited_transcriber_delegates() {
        let limiter = RateLimiter::direct(Quota::per_second(NonZeroU32::new(100).unwrap()));
        let transcriber = RateLimitedTranscriber::new(MockTranscriber::new("spoken words"), limiter);

        let text = transcriber
            .transcribe(AudioClip::new(vec![1, 2], "a.wav"))
            .await
            .unwrap();
        assert_eq!(text, "spoken words");
    }
}
