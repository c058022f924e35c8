//! The self-describing header of a persisted collection

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use crate::index::VectorIndex;

/// File name of the manifest inside a collection directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Layout version written by this build
pub const FORMAT_VERSION: u32 = 1;

/// Summary of a persisted collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document_count: usize,
    pub passage_count: usize,
    /// Embedding size, absent while the collection has no passages
    pub dimensions: Option<usize>,
}

impl Manifest {
    /// Describe `index` as it is about to be written under `name`
    pub fn for_index(name: &str, index: &VectorIndex) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: name.to_string(),
            created_at: index.created_at(),
            updated_at: Utc::now(),
            document_count: index.len(),
            passage_count: index.passages().len(),
            dimensions: index.dimensions(),
        }
    }

    pub(crate) async fn read(dir: &Path) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(dir.join(MANIFEST_FILE)).await?;
        let manifest: Self = serde_json::from_slice(&bytes)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedFormat(manifest.format_version));
        }
        Ok(manifest)
    }

    pub(crate) async fn write(&self, dir: &Path) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(dir.join(MANIFEST_FILE), bytes).await?;
        Ok(())
    }
}
