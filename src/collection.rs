//! # Collection Lifecycle Module
//!
//! `CollectionManager` ties the pipeline together. It normalizes inputs into
//! documents, builds or extends a collection's index, persists it through the
//! `CollectionStore`, and answers queries against a freshly loaded copy.
//!
//! ## Ingestion Modes
//!
//! - Bulk rebuild (`build`, `create_collection`): a new index is built from a
//!   batch of documents and replaces whatever the collection held before.
//! - Incremental update (`ingest_single_file`): the existing index is loaded,
//!   one document is inserted, and the result replaces the old directory. The
//!   collection must already exist.
//!
//! ## Concurrency
//!
//! Mutations of a name hold its write lock from load to persist, so concurrent
//! ingests into one collection never lose an update. Queries hold the read lock
//! only while loading. Queries never cache an index: each one reloads from disk.

use rig::{completion::CompletionModel, embeddings::EmbeddingModel};
use tracing::{info, instrument, warn};

use crate::config::ArchivistConfig;
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::ingest::{
    Document, DocumentNormalizer, FileKind, IngestError, IngestRequest, ItemFailure,
};
use crate::model::{Client, Transcriber};
use crate::search::{self, Answer, SearchResult};
use crate::store::{CollectionLocks, CollectionStore, Manifest, validate_name};

/// Outcome of building a collection from a batch request
#[derive(Debug)]
pub struct BuildReport {
    /// The persisted collection
    pub manifest: Manifest,

    /// Inputs that were skipped, with the reason
    pub failures: Vec<ItemFailure>,
}

/// Builds, persists, mutates and queries collections
pub struct CollectionManager<C, E, T>
where
    C: CompletionModel,
    E: EmbeddingModel,
    T: Transcriber,
{
    config: ArchivistConfig,
    client: Client<C, E>,
    normalizer: DocumentNormalizer<T>,
    store: CollectionStore,
    locks: CollectionLocks,
}

impl<C, E, T> CollectionManager<C, E, T>
where
    C: CompletionModel,
    E: EmbeddingModel,
    T: Transcriber,
{
    /// Create a manager over `config.data_dir` with the given capabilities
    pub async fn new(config: ArchivistConfig, client: Client<C, E>, transcriber: T) -> Result<Self> {
        config.validate()?;
        let normalizer = DocumentNormalizer::new(transcriber, config.normalizer.clone())?;
        let store = CollectionStore::open(&config.data_dir).await?;
        Ok(Self {
            config,
            client,
            normalizer,
            store,
            locks: CollectionLocks::new(),
        })
    }

    pub fn config(&self) -> &ArchivistConfig {
        &self.config
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn normalizer(&self) -> &DocumentNormalizer<T> {
        &self.normalizer
    }

    /// Whether collection `name` exists
    pub async fn exists(&self, name: &str) -> bool {
        if validate_name(name).is_err() {
            return false;
        }
        let _guard = self.locks.read(name).await;
        self.store.exists(name).await
    }

    /// Build collection `name` from `documents`, replacing any previous content
    ///
    /// An empty batch produces an empty, queryable collection.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn build(&self, name: &str, documents: Vec<Document>) -> Result<Manifest> {
        validate_name(name)?;
        let _guard = self.locks.write(name).await;

        let index = VectorIndex::build(
            documents,
            self.client.embedding(),
            &self.config.index.chunk_options,
        )
        .await?;
        Ok(self.store.persist(name, &index).await?)
    }

    /// Create collection `name`, optionally from a batch of inputs
    ///
    /// Inputs that fail to fetch or transcribe are skipped and listed in the
    /// report. A request with no inputs at all is rejected before any work. If
    /// every input fails, the first failure is returned and an existing
    /// collection keeps its content.
    #[instrument(skip(self, request))]
    pub async fn create_collection(
        &self,
        name: &str,
        request: Option<IngestRequest>,
    ) -> Result<BuildReport> {
        validate_name(name)?;

        let (documents, failures) = match request {
            None => (Vec::new(), Vec::new()),
            Some(request) => {
                let outcome = self.normalizer.normalize(request).await?;
                let (documents, mut failures) = (outcome.documents, outcome.failures);
                if documents.is_empty() && !failures.is_empty() {
                    warn!("Every input for {} failed, keeping the collection as is", name);
                    return Err(failures.swap_remove(0).error.into());
                }
                (documents, failures)
            }
        };

        let manifest = self.build(name, documents).await?;
        info!(
            "Created collection {} with {} documents, {} inputs skipped",
            name,
            manifest.document_count,
            failures.len()
        );
        Ok(BuildReport { manifest, failures })
    }

    /// Add one uploaded file to existing collection `name`
    ///
    /// `.txt` files are decoded as text; `.mp3`, `.wav`, `.ogg` and `.audio`
    /// files are transcribed. Other extensions are rejected.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn ingest_single_file(
        &self,
        name: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Manifest> {
        validate_name(name)?;
        if let FileKind::Unsupported(extension) = FileKind::from_filename(filename) {
            return Err(IngestError::unsupported(filename, &extension).into());
        }
        if !self.exists(name).await {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        let document = self.normalizer.from_file(filename, bytes).await?;
        self.insert(name, document).await
    }

    /// Incrementally add `document` to existing collection `name`
    #[instrument(skip(self, document))]
    pub async fn insert(&self, name: &str, document: Document) -> Result<Manifest> {
        validate_name(name)?;
        let _guard = self.locks.write(name).await;

        let mut index = self.store.load(name).await?;
        index
            .insert(
                document,
                self.client.embedding(),
                &self.config.index.chunk_options,
            )
            .await?;
        Ok(self.store.persist(name, &index).await?)
    }

    /// Load collection `name` into memory
    pub async fn load(&self, name: &str) -> Result<VectorIndex> {
        validate_name(name)?;
        let _guard = self.locks.read(name).await;
        Ok(self.store.load(name).await?)
    }

    /// Answer `prompt` from collection `name`
    pub async fn query(&self, name: &str, prompt: &str) -> Result<String> {
        Ok(self.query_with_sources(name, prompt).await?.text)
    }

    /// Answer `prompt` from collection `name`, with the passages used
    #[instrument(skip(self))]
    pub async fn query_with_sources(&self, name: &str, prompt: &str) -> Result<Answer> {
        check_prompt(prompt)?;
        let index = self.load(name).await?;
        Ok(search::answer(&self.client, &index, prompt, self.config.index.top_k).await?)
    }

    /// The passages of collection `name` most relevant to `prompt`, without an answer
    #[instrument(skip(self))]
    pub async fn retrieve(&self, name: &str, prompt: &str) -> Result<Vec<SearchResult>> {
        check_prompt(prompt)?;
        let index = self.load(name).await?;
        Ok(search::search_index(
            &index,
            self.client.embedding(),
            prompt,
            self.config.index.top_k,
        )
        .await?)
    }

    /// Delete collection `name`
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let _guard = self.locks.write(name).await;
        Ok(self.store.delete(name).await?)
    }

    /// Manifests of all collections
    pub async fn list(&self) -> Result<Vec<Manifest>> {
        Ok(self.store.list().await?)
    }
}

fn check_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::Validation("Prompt must not be empty".to_string()));
    }
    Ok(())
}
