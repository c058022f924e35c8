//! # Collection Store Module
//!
//! One directory per collection under a data root:
//!
//! ```text
//! <root>/<name>/manifest.json
//! <root>/<name>/index.db
//! <root>/.staging/
//! ```
//!
//! A persist writes a complete new directory under `.staging`, then swaps it in
//! with renames: the old directory is moved aside, the new one moved into place,
//! and the old one removed. If moving the new directory in fails the old one is
//! moved back. Readers therefore see either the old or the new directory, never
//! a partially written one.
//!
//! The store does no locking of its own. Callers serialize mutations of a name
//! with `CollectionLocks`.

mod error;
mod locks;
mod manifest;

pub use error::StoreError;
pub use locks::{CollectionGuard, CollectionLocks};
pub use manifest::{FORMAT_VERSION, MANIFEST_FILE, Manifest};

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::index::{Database, VectorIndex};

/// File name of the index database inside a collection directory
pub const INDEX_FILE: &str = "index.db";

const STAGING_DIR: &str = ".staging";

static NAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").ok());

/// Check that `name` is usable as a collection directory
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    match NAME_PATTERN.as_ref() {
        Some(pattern) if pattern.is_match(name) => Ok(()),
        _ => Err(StoreError::InvalidName(name.to_string())),
    }
}

/// Persisted collections under one data directory
#[derive(Debug, Clone)]
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    /// Open the store at `root`, creating it if needed
    ///
    /// Leftovers of interrupted persists are cleaned up: a directory that was
    /// moved aside and never replaced is restored, anything else is removed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { root: root.into() };
        tokio::fs::create_dir_all(store.staging_root()).await?;
        store.recover().await?;
        Ok(store)
    }

    fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    fn collection_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Scratch path for `name`; names never contain '.', so the suffix is unambiguous
    fn scratch_dir(&self, name: &str, kind: &str) -> PathBuf {
        self.staging_root()
            .join(format!("{}.{}.{}", name, Uuid::new_v4().simple(), kind))
    }

    /// Whether a collection with this name has been persisted
    pub async fn exists(&self, name: &str) -> bool {
        match self.collection_dir(name) {
            Ok(dir) => tokio::fs::try_exists(dir.join(MANIFEST_FILE))
                .await
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Write `index` as the full content of collection `name`
    #[instrument(skip(self, index), fields(documents = index.len()))]
    pub async fn persist(&self, name: &str, index: &VectorIndex) -> Result<Manifest, StoreError> {
        let target = self.collection_dir(name)?;
        let staging = self.scratch_dir(name, "new");

        let manifest = match self.write_staging(name, index, &staging).await {
            Ok(manifest) => manifest,
            Err(err) => {
                discard(&staging).await;
                return Err(err);
            }
        };

        let aside = if tokio::fs::try_exists(&target).await? {
            let aside = self.scratch_dir(name, "old");
            if let Err(err) = tokio::fs::rename(&target, &aside).await {
                discard(&staging).await;
                return Err(err.into());
            }
            Some(aside)
        } else {
            None
        };

        if let Err(err) = tokio::fs::rename(&staging, &target).await {
            if let Some(aside) = &aside {
                if let Err(restore) = tokio::fs::rename(aside, &target).await {
                    warn!(
                        "Failed to restore {} from {}: {}",
                        name,
                        aside.display(),
                        restore
                    );
                }
            }
            discard(&staging).await;
            return Err(err.into());
        }

        if let Some(aside) = aside {
            discard(&aside).await;
        }

        info!(
            "Persisted collection {} ({} documents, {} passages)",
            name, manifest.document_count, manifest.passage_count
        );
        Ok(manifest)
    }

    async fn write_staging(
        &self,
        name: &str,
        index: &VectorIndex,
        staging: &Path,
    ) -> Result<Manifest, StoreError> {
        tokio::fs::create_dir_all(staging).await?;

        let db = Database::open(&staging.join(INDEX_FILE)).await?;
        db.write(index.documents(), index.passages()).await?;
        drop(db);

        let manifest = Manifest::for_index(name, index);
        manifest.write(staging).await?;
        debug!("Staged {} at {}", name, staging.display());
        Ok(manifest)
    }

    /// Read collection `name` back into memory
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<VectorIndex, StoreError> {
        let dir = self.collection_dir(name)?;
        if !self.exists(name).await {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let manifest = Manifest::read(&dir).await?;
        let db_path = dir.join(INDEX_FILE);
        if !tokio::fs::try_exists(&db_path).await? {
            return Err(StoreError::Corrupt {
                name: name.to_string(),
                message: format!("missing {}", INDEX_FILE),
            });
        }

        let db = Database::open(&db_path).await?;
        let (documents, passages) = db.read().await?;
        if documents.len() != manifest.document_count || passages.len() != manifest.passage_count
        {
            return Err(StoreError::Corrupt {
                name: name.to_string(),
                message: format!(
                    "manifest lists {} documents and {} passages, index holds {} and {}",
                    manifest.document_count,
                    manifest.passage_count,
                    documents.len(),
                    passages.len()
                ),
            });
        }

        Ok(VectorIndex::from_parts(
            manifest.created_at,
            documents,
            passages,
        )?)
    }

    /// Remove collection `name` and everything in it
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let dir = self.collection_dir(name)?;
        if !self.exists(name).await {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let aside = self.scratch_dir(name, "deleted");
        tokio::fs::rename(&dir, &aside).await?;
        tokio::fs::remove_dir_all(&aside).await?;
        info!("Deleted collection {}", name);
        Ok(())
    }

    /// Manifests of all persisted collections, sorted by name
    pub async fn list(&self) -> Result<Vec<Manifest>, StoreError> {
        let mut manifests = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_name(&name).is_err() || !self.exists(&name).await {
                continue;
            }
            match Manifest::read(&entry.path()).await {
                Ok(manifest) => manifests.push(manifest),
                Err(err) => warn!("Skipping collection {}: {}", name, err),
            }
        }
        manifests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(manifests)
    }

    async fn recover(&self) -> Result<(), StoreError> {
        let mut entries = tokio::fs::read_dir(self.staging_root()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            let restorable = file_name
                .strip_suffix(".old")
                .and_then(|rest| rest.split_once('.'))
                .map(|(name, _)| name.to_string())
                .filter(|name| validate_name(name).is_ok());

            if let Some(name) = restorable {
                let target = self.root.join(&name);
                if !tokio::fs::try_exists(&target).await? {
                    warn!("Restoring collection {} from interrupted persist", name);
                    tokio::fs::rename(&path, &target).await?;
                    continue;
                }
            }
            discard(&path).await;
        }
        Ok(())
    }
}

/// Remove a scratch directory, logging instead of failing
async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(path).await {
        warn!("Failed to remove {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Document;
    use crate::model::mock::HashEmbeddingModel;
    use crate::processor::ChunkOptions;
    use tempfile::tempdir;

    async fn index_of(texts: &[&str]) -> VectorIndex {
        let documents = texts.iter().filter_map(|t| Document::new(*t)).collect();
        VectorIndex::build(documents, &HashEmbeddingModel::default(), &ChunkOptions::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("docs").is_ok());
        assert!(validate_name("team_2-notes").is_ok());
        assert!(validate_name("9lives").is_ok());
        for bad in ["", "..", "../etc", "a/b", ".staging", "-x", "with space", "a.b"] {
            assert!(
                matches!(validate_name(bad), Err(StoreError::InvalidName(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();
        let index = index_of(&["alpha beta", "gamma"]).await;

        assert!(!store.exists("docs").await);
        let manifest = store.persist("docs", &index).await.unwrap();
        assert!(store.exists("docs").await);
        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.passage_count, 2);
        assert_eq!(manifest.dimensions, Some(64));

        let loaded = store.load("docs").await.unwrap();
        assert_eq!(loaded.documents(), index.documents());
        assert_eq!(loaded.created_at(), index.created_at());
        for (a, b) in loaded.passages().iter().zip(index.passages()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.embedding.vec, b.embedding.vec);
        }
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();

        store.persist("docs", &index_of(&["old"]).await).await.unwrap();
        store
            .persist("docs", &index_of(&["new one", "new two"]).await)
            .await
            .unwrap();

        let loaded = store.load("docs").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.documents()[0].text(), "new one");

        let mut staging = tokio::fs::read_dir(dir.path().join(STAGING_DIR)).await.unwrap();
        assert!(staging.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();
        store.persist("empty", &VectorIndex::new()).await.unwrap();

        let loaded = store.load("empty").await.unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.passages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.load("missing").await,
            Err(StoreError::NotFound(name)) if name == "missing"
        ));
        assert!(matches!(
            store.delete("missing").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();
        store.persist("docs", &index_of(&["text"]).await).await.unwrap();

        store.delete("docs").await.unwrap();
        assert!(!store.exists("docs").await);
        assert!(!dir.path().join("docs").exists());
        assert!(matches!(
            store.delete("docs").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();
        store.persist("zeta", &VectorIndex::new()).await.unwrap();
        store.persist("alpha", &index_of(&["one"]).await).await.unwrap();
        tokio::fs::create_dir(dir.path().join("stray")).await.unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_invalid_name_never_touches_disk() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();

        let err = store
            .persist("../escape", &VectorIndex::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
        assert!(!store.exists("../escape").await);
    }

    #[tokio::test]
    async fn test_open_restores_interrupted_swap() {
        let dir = tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).await.unwrap();
        store.persist("docs", &index_of(&["kept"]).await).await.unwrap();

        let aside = dir.path().join(STAGING_DIR).join("docs.0123.old");
        std::fs::rename(dir.path().join("docs"), &aside).unwrap();
        std::fs::create_dir(dir.path().join(STAGING_DIR).join("docs.4567.new")).unwrap();

        let store = CollectionStore::open(dir.path()).await.unwrap();
        let loaded = store.load("docs").await.unwrap();
        assert_eq!(loaded.documents()[0].text(), "kept");
        assert!(!aside.exists());
        assert!(!dir.path().join(STAGING_DIR).join("docs.4567.new").exists());
    }
}
