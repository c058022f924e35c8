//! Retrieval of audio inputs ahead of transcription

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::error::IngestError;
use crate::model::AudioClip;

/// Where an audio input comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// Remote audio, downloaded before transcription
    Url(String),
    /// Audio uploaded with the request
    Upload { filename: String, bytes: Vec<u8> },
}

impl AudioSource {
    /// Human-readable name used in logs and failure reports
    pub fn describe(&self) -> &str {
        match self {
            AudioSource::Url(url) => url,
            AudioSource::Upload { filename, .. } => filename,
        }
    }
}

/// Download remote audio through a scratch file in `scratch_dir` and hand back its bytes
///
/// The scratch file is removed when it goes out of scope, whether the download
/// succeeds or not.
#[instrument(skip(http))]
pub(crate) async fn download(
    http: &reqwest::Client,
    url: &str,
    scratch_dir: &Path,
) -> Result<AudioClip, IngestError> {
    let fetch_error = |e: reqwest::Error| IngestError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    };

    let mut response = http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(fetch_error)?;

    let dir = scratch_dir.to_path_buf();
    let scratch = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix("archivist-audio-")
            .tempfile_in(dir)
    })
    .await
    .map_err(|e| IngestError::Other(format!("Scratch file task failed: {}", e)))??;
    let (file, path) = scratch.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    debug!("Buffering {} into {}", url, path.display());

    while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    let bytes = tokio::fs::read(&path).await?;
    if bytes.is_empty() {
        return Err(IngestError::Fetch {
            url: url.to_string(),
            message: "empty response body".to_string(),
        });
    }

    Ok(AudioClip::new(bytes, filename_from_url(url)))
}

/// Last path segment of a URL, for providers that sniff the format from the name
fn filename_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "audio".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::net::TcpListener;

    fn is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://cdn.example.com/a/b/talk.mp3"), "talk.mp3");
        assert_eq!(filename_from_url("https://cdn.example.com/"), "audio");
        assert_eq!(filename_from_url("not a url"), "audio");
    }

    #[test]
    fn test_describe() {
        let remote = AudioSource::Url("https://example.com/a.wav".to_string());
        assert_eq!(remote.describe(), "https://example.com/a.wav");

        let upload = AudioSource::Upload {
            filename: "memo.ogg".to_string(),
            bytes: vec![1],
        };
        assert_eq!(upload.describe(), "memo.ogg");
    }

    #[tokio::test]
    async fn test_download() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/talk.wav")
            .with_status(200)
            .with_body("RIFF....WAVE")
            .create_async()
            .await;

        let url = format!("{}/talk.wav", server.url());
        let scratch = tempdir().unwrap();
        let clip = download(&reqwest::Client::new(), &url, scratch.path())
            .await
            .unwrap();
        assert_eq!(clip.bytes, b"RIFF....WAVE".to_vec());
        assert_eq!(clip.filename, "talk.wav");
        assert!(is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_download_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone.mp3")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/gone.mp3", server.url());
        let scratch = tempdir().unwrap();
        let err = download(&reqwest::Client::new(), &url, scratch.path())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Fetch { .. }));
        assert!(is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn test_truncated_body_releases_scratch_file() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 1024];
                let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut request).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial audio")
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        let url = format!("http://{}/cut.mp3", address);
        let scratch = tempdir().unwrap();
        let err = download(&reqwest::Client::new(), &url, scratch.path())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Fetch { .. }));
        assert!(is_empty(scratch.path()));
        server.await.unwrap();
    }
}
