//! Transcription through an OpenAI-compatible `/audio/transcriptions` endpoint

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::transcription::{AudioClip, Transcriber, TranscriptionError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper-style HTTP transcriber
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber for the default OpenAI endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a transcriber from `OPENAI_API_KEY`, with optional
    /// `ARCHIVIST_TRANSCRIPTION_URL` and `ARCHIVIST_TRANSCRIPTION_MODEL` overrides
    pub fn from_env() -> Result<Self, TranscriptionError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            TranscriptionError::Other("OPENAI_API_KEY environment variable must be set".into())
        })?;
        let mut transcriber = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ARCHIVIST_TRANSCRIPTION_URL") {
            transcriber = transcriber.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("ARCHIVIST_TRANSCRIPTION_MODEL") {
            transcriber = transcriber.with_model(model);
        }
        Ok(transcriber)
    }

    /// Point the transcriber at another compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use another transcription model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self, clip), fields(filename = %clip.filename, bytes = clip.bytes.len()))]
    async fn transcribe(&self, clip: AudioClip) -> Result<String, TranscriptionError> {
        let part = Part::bytes(clip.bytes).file_name(clip.filename);
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        let text = body.text.trim().to_string();
        if text.is_empty() {
            return Err(TranscriptionError::Empty);
        }

        debug!("Transcribed {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transcribe_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":" Hallo Welt "}"#)
            .create_async()
            .await;

        let transcriber = WhisperTranscriber::new("secret").with_base_url(server.url());
        let text = transcriber
            .transcribe(AudioClip::new(vec![1, 2, 3], "clip.wav"))
            .await
            .unwrap();

        assert_eq!(text, "Hallo Welt");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/audio/transcriptions")
            .with_status(400)
            .with_body("bad audio")
            .create_async()
            .await;

        let transcriber = WhisperTranscriber::new("secret").with_base_url(server.url());
        let err = transcriber
            .transcribe(AudioClip::new(vec![0], "clip.mp3"))
            .await
            .unwrap_err();

        match err {
            TranscriptionError::Api {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 400);
                assert_eq!(message, "bad audio");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transcribe_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/audio/transcriptions")
            .with_status(200)
            .with_body(r#"{"text":"   "}"#)
            .create_async()
            .await;

        let transcriber = WhisperTranscriber::new("secret").with_base_url(server.url());
        let err = transcriber
            .transcribe(AudioClip::new(vec![0], "clip.ogg"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::Empty));
    }
}
