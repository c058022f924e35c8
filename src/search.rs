//! # Semantic Search Module for RAG
//!
//! Retrieval and answer generation over a loaded `VectorIndex`.
//!
//! ## Search Process
//!
//! 1. Embed the prompt with the collection's embedding model
//! 2. Rank passages by cosine similarity and keep the `top_k` best
//! 3. Attach the passages as context documents to a completion request
//! 4. Return the model's text together with the passages it was given
//!
//! An index without passages answers `EMPTY_RESPONSE` and calls neither model.

mod error;

pub use error::SearchError;

use std::collections::{BTreeMap, HashMap};

use rig::completion::{AssistantContent, CompletionModel, Document};
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::index::VectorIndex;
use crate::model::Client;

/// Answer returned for a collection with nothing to retrieve
pub const EMPTY_RESPONSE: &str = "Empty Response";

const RAG_PREAMBLE: &str = "Answer the question using only the context documents provided. \
If the documents do not contain the answer, say that you do not know.";

/// A retrieved passage with its score and source metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Text of the passage
    pub text: String,

    /// Cosine similarity to the prompt
    pub score: f64,

    /// Position of the source document in the collection
    pub document_id: usize,

    /// Position of the passage within its document
    pub position: usize,

    /// Metadata of the source document
    pub metadata: BTreeMap<String, String>,
}

/// A generated answer and the passages it was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchResult>,
}

/// Retrieve the `top_k` passages most relevant to `prompt`
#[instrument(skip(index, embedder), fields(passages = index.passages().len()))]
pub async fn search_index<E: EmbeddingModel>(
    index: &VectorIndex,
    embedder: &E,
    prompt: &str,
    top_k: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    if prompt.trim().is_empty() {
        return Err(SearchError::EmptyPrompt);
    }
    let Some(dims) = index.dimensions() else {
        return Ok(Vec::new());
    };

    let query = embedder
        .embed_texts(vec![prompt.to_string()])
        .await
        .map_err(|e| SearchError::Embedding(e.to_string()))?
        .pop()
        .ok_or_else(|| SearchError::Embedding("No embedding returned for prompt".to_string()))?;
    if query.vec.len() != dims {
        return Err(SearchError::DimensionMismatch {
            query: query.vec.len(),
            index: dims,
        });
    }

    let results: Vec<_> = index
        .nearest(&query.vec, top_k)
        .into_iter()
        .map(|(score, passage)| SearchResult {
            text: passage.text.clone(),
            score,
            document_id: passage.document_id,
            position: passage.position,
            metadata: index
                .document(passage.document_id)
                .map(|document| document.metadata().clone())
                .unwrap_or_default(),
        })
        .collect();

    debug!("Retrieved {} passages", results.len());
    Ok(results)
}

/// Turn retrieved passages into completion context documents
pub fn prepare_rag_context(results: &[SearchResult]) -> Vec<Document> {
    results
        .iter()
        .map(|result| Document {
            id: format!("doc{}-{}", result.document_id, result.position),
            text: result.text.clone(),
            additional_props: result
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<_, _>>(),
        })
        .collect()
}

/// Ask the completion model to answer `prompt` from the retrieved passages
#[instrument(skip(model, results), fields(context = results.len()))]
pub async fn generate_answer_with_rag<M: CompletionModel>(
    model: &M,
    prompt: &str,
    results: &[SearchResult],
) -> Result<String, SearchError> {
    let response = model
        .completion_request(prompt.to_string())
        .preamble(RAG_PREAMBLE.to_string())
        .documents(prepare_rag_context(results))
        .send()
        .await
        .map_err(|e| SearchError::Completion(e.to_string()))?;

    let text = response
        .choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("\n");

    Ok(text)
}

/// Retrieve passages for `prompt` and generate an answer from them
pub async fn answer<C, E>(
    client: &Client<C, E>,
    index: &VectorIndex,
    prompt: &str,
    top_k: usize,
) -> Result<Answer, SearchError>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    let sources = search_index(index, client.embedding(), prompt, top_k).await?;
    if sources.is_empty() {
        return Ok(Answer {
            text: EMPTY_RESPONSE.to_string(),
            sources,
        });
    }

    let text = generate_answer_with_rag(client.completion(), prompt, &sources).await?;
    Ok(Answer { text, sources })
}
