//! The normalized unit of ingested content

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key for the page a web document was fetched from
pub const SOURCE_URL: &str = "source_url";

/// Metadata key for the remote audio a document was transcribed from
pub const AUDIO_URL: &str = "audio_url";

/// Metadata key for the name of an uploaded file
pub const FILENAME: &str = "filename";

/// Metadata key for a web page title
pub const TITLE: &str = "title";

/// Text plus string metadata, ready to be indexed
///
/// The text is never blank. A document is immutable once built; the builder
/// methods consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document, or `None` when `text` is blank
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            text,
            metadata: BTreeMap::new(),
        })
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Rebuild a document from persisted parts
    pub(crate) fn from_parts(text: String, metadata: BTreeMap<String, String>) -> Self {
        Self { text, metadata }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Look up a single metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(Document::new("").is_none());
        assert!(Document::new("  \n\t").is_none());
    }

    #[test]
    fn test_metadata() {
        let document = Document::new("content")
            .unwrap()
            .with_metadata(SOURCE_URL, "https://example.com")
            .with_metadata(TITLE, "Example");

        assert_eq!(document.text(), "content");
        assert_eq!(document.meta(SOURCE_URL), Some("https://example.com"));
        assert_eq!(document.meta(TITLE), Some("Example"));
        assert_eq!(document.meta(AUDIO_URL), None);
        assert_eq!(document.metadata().len(), 2);
    }
}
