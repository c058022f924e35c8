//! # Model Capability Module
//!
//! This module provides the capability clients the ingestion and retrieval
//! pipeline is built on: completion, embedding and audio transcription. They are
//! constructed once at startup and passed explicitly into the components that
//! need them.
//!
//! ## Key Components
//!
//! - `Client`: A unified client that wraps both completion and embedding models
//! - `RateLimitedCompletionModel`: A wrapper that adds rate limiting to any completion model
//! - `RateLimitedEmbeddingModel`: A wrapper that adds rate limiting to any embedding model
//! - `RateLimitedTranscriber`: The same for transcription
//! - `Transcriber`: The speech-to-text capability, with `WhisperTranscriber` as the
//!   HTTP implementation
//! - `EmbeddingConversion`: Utilities for converting between embedding formats
//! - `mock`: Deterministic models for tests and offline use

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use rig::{completion::CompletionModel, embeddings::EmbeddingModel, providers::gemini};

use crate::error::Error;

pub mod embedding;
pub mod mock;
pub mod ratelimited;
pub mod transcription;
pub mod whisper;

pub use embedding::EmbeddingConversion;
pub use ratelimited::{RateLimitedCompletionModel, RateLimitedEmbeddingModel, RateLimitedTranscriber};
pub use transcription::{AudioClip, Transcriber, TranscriptionError};
pub use whisper::WhisperTranscriber;

/// Completion and embedding capabilities used together
#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

/// Gemini client with rate limiting on both models
pub type GeminiClient = Client<
    RateLimitedCompletionModel<gemini::completion::CompletionModel>,
    RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>,
>;

impl GeminiClient {
    /// Build a Gemini client from `GEMINI_API_KEY`
    pub fn new_gemini_from_env() -> Result<Self, Error> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            Error::Validation("GEMINI_API_KEY environment variable must be set".to_string())
        })?;
        let gemini_client = gemini::Client::new(&gemini_api_key);
        Ok(Self::new_gemini(gemini_client))
    }

    pub fn new_gemini(gemini_client: gemini::Client) -> Self {
        let completion_limiter = RateLimiter::direct(Quota::per_minute(
            NonZeroU32::new(2000).unwrap_or(NonZeroU32::MIN),
        ));
        let embedding_limiter = RateLimiter::direct(Quota::per_minute(
            NonZeroU32::new(1000).unwrap_or(NonZeroU32::MIN),
        ));
        let completion_model = RateLimitedCompletionModel::new(
            gemini_client.completion_model("gemini-2.0-flash"),
            completion_limiter,
        );
        let embedding_model = RateLimitedEmbeddingModel::new(
            gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
            embedding_limiter,
        );
        Self::new(completion_model, embedding_model)
    }
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// Bundle an already constructed completion and embedding model
    pub fn new(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}
