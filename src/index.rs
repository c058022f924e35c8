//! # Vector Index Module
//!
//! The searchable form of a collection: its documents, the passages they were
//! chunked into, and one embedding per passage. `VectorIndex` is the in-memory
//! structure; `Database` moves it to and from a libsql file.
//!
//! ## Precision
//!
//! Embeddings are persisted as `f32`. Freshly computed embeddings are rounded to
//! `f32` before they enter the index, so an index read back from disk ranks
//! passages exactly like the one that was written.

mod config;
mod database;
pub mod error;
mod schema;

pub use config::IndexConfig;
pub use database::Database;
pub use error::IndexError;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rig::embeddings::{Embedding, EmbeddingModel};
use tracing::{debug, instrument};

use crate::ingest::Document;
use crate::model::embedding::{EmbeddingConversion, cosine_similarity};
use crate::processor::{ChunkOptions, chunk_text};

/// A chunk of an indexed document with its embedding
#[derive(Debug, Clone)]
pub struct Passage {
    /// Position of the owning document in the index
    pub document_id: usize,

    /// Position of the passage within its document
    pub position: usize,

    /// Text of the passage
    pub text: String,

    /// Embedding of the passage text
    pub embedding: Embedding,
}

/// Documents and their embedded passages
#[derive(Debug, Clone)]
pub struct VectorIndex {
    created_at: DateTime<Utc>,
    documents: Vec<Document>,
    passages: Vec<Passage>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    /// An index without documents
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            documents: Vec::new(),
            passages: Vec::new(),
        }
    }

    /// Reassemble an index from persisted parts, checking they fit together
    pub fn from_parts(
        created_at: DateTime<Utc>,
        documents: Vec<Document>,
        passages: Vec<Passage>,
    ) -> Result<Self, IndexError> {
        if let Some(passage) = passages.iter().find(|p| p.document_id >= documents.len()) {
            return Err(IndexError::Data(format!(
                "Passage refers to missing document {}",
                passage.document_id
            )));
        }
        if let Some(first) = passages.first() {
            let dims = first.embedding.vec.len();
            if passages.iter().any(|p| p.embedding.vec.len() != dims) {
                return Err(IndexError::Data(
                    "Passages have embeddings of different sizes".to_string(),
                ));
            }
        }

        Ok(Self {
            created_at,
            documents,
            passages,
        })
    }

    /// Build an index from a batch of documents
    pub async fn build<E: EmbeddingModel>(
        documents: Vec<Document>,
        embedder: &E,
        options: &ChunkOptions,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new();
        index.insert_all(documents, embedder, options).await?;
        Ok(index)
    }

    /// Add one document, returning the number of passages it produced
    pub async fn insert<E: EmbeddingModel>(
        &mut self,
        document: Document,
        embedder: &E,
        options: &ChunkOptions,
    ) -> Result<usize, IndexError> {
        self.insert_all(vec![document], embedder, options).await
    }

    /// Add documents, returning the number of passages they produced
    ///
    /// Either every document is added or, on error, the index is left unchanged.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn insert_all<E: EmbeddingModel>(
        &mut self,
        documents: Vec<Document>,
        embedder: &E,
        options: &ChunkOptions,
    ) -> Result<usize, IndexError> {
        let chunks: Vec<_> = documents
            .iter()
            .enumerate()
            .flat_map(|(offset, document)| {
                chunk_text(document.text(), options)
                    .into_iter()
                    .map(move |chunk| (offset, chunk))
            })
            .collect();

        let texts: Vec<String> = chunks.iter().map(|(_, chunk)| chunk.text.clone()).collect();
        let embeddings = embed_all(embedder, &texts).await?;

        let expected = self
            .dimensions()
            .or_else(|| embeddings.first().map(|e| e.vec.len()));
        if let Some(dims) = expected {
            if let Some(bad) = embeddings.iter().find(|e| e.vec.len() != dims) {
                return Err(IndexError::Embedding(format!(
                    "Expected {} dimensions, got {}",
                    dims,
                    bad.vec.len()
                )));
            }
        }

        let base = self.documents.len();
        let added = chunks.len();
        self.passages.extend(chunks.into_iter().zip(embeddings).map(
            |((offset, chunk), embedding)| Passage {
                document_id: base + offset,
                position: chunk.position,
                text: chunk.text,
                embedding: embedding.quantized(),
            },
        ));
        self.documents.extend(documents);

        debug!("Indexed {} passages", added);
        Ok(added)
    }

    /// The `top_k` passages most similar to `query`, best first
    ///
    /// Equal scores keep insertion order.
    pub fn nearest(&self, query: &[f64], top_k: usize) -> Vec<(f64, &Passage)> {
        let mut scored: Vec<_> = self
            .passages
            .iter()
            .map(|passage| (cosine_similarity(query, &passage.embedding.vec), passage))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// The document a passage belongs to
    pub fn document(&self, id: usize) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Size of the stored embeddings, unknown until a passage exists
    pub fn dimensions(&self) -> Option<usize> {
        self.passages.first().map(|p| p.embedding.vec.len())
    }
}

/// Embed texts in batches the model accepts
async fn embed_all<E: EmbeddingModel>(
    embedder: &E,
    texts: &[String],
) -> Result<Vec<Embedding>, IndexError> {
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(E::MAX_DOCUMENTS.max(1)) {
        let batch_embeddings = embedder
            .embed_texts(batch.to_vec())
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;
        if batch_embeddings.len() != batch.len() {
            return Err(IndexError::Embedding(format!(
                "Requested {} embeddings, got {}",
                batch.len(),
                batch_embeddings.len()
            )));
        }
        embeddings.extend(batch_embeddings);
    }
    Ok(embeddings)
}
