//! Dispatch of uploaded files by extension

use std::path::Path;

/// Audio containers accepted for transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    /// `.audio`, format left to the transcriber
    Generic,
}

/// What an uploaded file is, resolved once from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// `.txt`, decoded as UTF-8
    Text,
    /// Transcribed to text
    Audio(AudioFormat),
    /// Anything else, carrying the offending extension (empty when there is none)
    Unsupported(String),
}

impl FileKind {
    /// Classify a file by its extension, case-insensitively
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => FileKind::Text,
            "mp3" => FileKind::Audio(AudioFormat::Mp3),
            "wav" => FileKind::Audio(AudioFormat::Wav),
            "ogg" => FileKind::Audio(AudioFormat::Ogg),
            "audio" => FileKind::Audio(AudioFormat::Generic),
            _ => FileKind::Unsupported(extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert_eq!(FileKind::from_filename("notes.txt"), FileKind::Text);
        assert_eq!(FileKind::from_filename("NOTES.TXT"), FileKind::Text);
        assert_eq!(
            FileKind::from_filename("talk.mp3"),
            FileKind::Audio(AudioFormat::Mp3)
        );
        assert_eq!(
            FileKind::from_filename("dir/clip.Wav"),
            FileKind::Audio(AudioFormat::Wav)
        );
        assert_eq!(
            FileKind::from_filename("voice.ogg"),
            FileKind::Audio(AudioFormat::Ogg)
        );
        assert_eq!(
            FileKind::from_filename("recording.audio"),
            FileKind::Audio(AudioFormat::Generic)
        );
    }

    #[test]
    fn test_unsupported_extensions() {
        assert_eq!(
            FileKind::from_filename("report.pdf"),
            FileKind::Unsupported("pdf".to_string())
        );
        assert_eq!(
            FileKind::from_filename("README"),
            FileKind::Unsupported(String::new())
        );
        assert_eq!(
            FileKind::from_filename("archive.txt.gz"),
            FileKind::Unsupported("gz".to_string())
        );
    }
}
