//! Database operations for the index module

use std::collections::BTreeMap;
use std::path::Path;

use libsql::{Connection, Row, params};
use rig::embeddings::Embedding;
use tracing::{debug, instrument};

use crate::index::error::IndexError;
use crate::index::{Passage, schema};
use crate::ingest::Document;
use crate::model::embedding::EmbeddingConversion;

/// A libsql file holding one collection index
pub struct Database {
    _db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` and make sure the schema exists
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self, IndexError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| IndexError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| IndexError::Connection(format!("Failed to connect to database: {}", e)))?;

        schema::initialize_schema(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    /// Write every document and passage in one transaction
    ///
    /// Meant for a fresh file; existing rows with the same ids make it fail.
    #[instrument(skip_all, fields(documents = documents.len(), passages = passages.len()))]
    pub async fn write(&self, documents: &[Document], passages: &[Passage]) -> Result<(), IndexError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| IndexError::Transaction(format!("Failed to start transaction: {}", e)))?;

        for (id, document) in documents.iter().enumerate() {
            let metadata = serde_json::to_string(document.metadata())?;
            tx.execute(
                "INSERT INTO documents (id, text, metadata) VALUES (?, ?, ?)",
                params![id as i64, document.text(), metadata],
            )
            .await?;
        }

        for (id, passage) in passages.iter().enumerate() {
            tx.execute(
                "INSERT INTO passages (id, document_id, position, text, embedding)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    id as i64,
                    passage.document_id as i64,
                    passage.position as i64,
                    passage.text.as_str(),
                    libsql::Value::Blob(passage.embedding.to_binary()),
                ],
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| IndexError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        debug!("Wrote {} documents", documents.len());
        Ok(())
    }

    /// Read all documents and passages back in their original order
    #[instrument(skip(self))]
    pub async fn read(&self) -> Result<(Vec<Document>, Vec<Passage>), IndexError> {
        let mut rows = self
            .conn
            .query("SELECT id, text, metadata FROM documents ORDER BY id", params![])
            .await?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(Self::row_to_document(&row, documents.len())?);
        }

        let mut rows = self
            .conn
            .query(
                "SELECT id, document_id, position, text, embedding FROM passages ORDER BY id",
                params![],
            )
            .await?;

        let mut passages = Vec::new();
        while let Some(row) = rows.next().await? {
            passages.push(Self::row_to_passage(&row, passages.len())?);
        }

        Ok((documents, passages))
    }

    fn row_to_document(row: &Row, expected_id: usize) -> Result<Document, IndexError> {
        let id: i64 = row.get(0)?;
        if id != expected_id as i64 {
            return Err(IndexError::Data(format!(
                "Document ids are not contiguous: expected {}, found {}",
                expected_id, id
            )));
        }
        let text: String = row.get(1)?;
        let metadata: String = row.get(2)?;
        let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata)?;
        Ok(Document::from_parts(text, metadata))
    }

    fn row_to_passage(row: &Row, expected_id: usize) -> Result<Passage, IndexError> {
        let id: i64 = row.get(0)?;
        if id != expected_id as i64 {
            return Err(IndexError::Data(format!(
                "Passage ids are not contiguous: expected {}, found {}",
                expected_id, id
            )));
        }
        let document_id: i64 = row.get(1)?;
        let position: i64 = row.get(2)?;
        let text: String = row.get(3)?;
        let blob: Vec<u8> = row.get(4)?;
        if blob.len() % 4 != 0 {
            return Err(IndexError::Data(format!(
                "Embedding of passage {} has a truncated vector",
                id
            )));
        }

        let mut embedding = Embedding::from_binary(&blob);
        embedding.document = text.clone();
        Ok(Passage {
            document_id: usize::try_from(document_id)
                .map_err(|_| IndexError::Data(format!("Invalid document id {}", document_id)))?,
            position: usize::try_from(position)
                .map_err(|_| IndexError::Data(format!("Invalid position {}", position)))?,
            text,
            embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn passage(document_id: usize, position: usize, text: &str, vec: Vec<f64>) -> Passage {
        Passage {
            document_id,
            position,
            text: text.to_string(),
            embedding: Embedding {
                document: text.to_string(),
                vec,
            },
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.db");

        let documents = vec![
            Document::new("first document")
                .unwrap()
                .with_metadata("source_url", "https://example.com"),
            Document::new("second document").unwrap(),
        ];
        let passages = vec![
            passage(0, 0, "first", vec![0.5, -0.25]),
            passage(0, 1, "document", vec![1.0, 0.0]),
            passage(1, 0, "second document", vec![0.0, 1.0]),
        ];

        let db = Database::open(&path).await.unwrap();
        db.write(&documents, &passages).await.unwrap();
        drop(db);

        let db = Database::open(&path).await.unwrap();
        let (read_documents, read_passages) = db.read().await.unwrap();

        assert_eq!(read_documents, documents);
        assert_eq!(read_passages.len(), 3);
        assert_eq!(read_passages[1].document_id, 0);
        assert_eq!(read_passages[1].position, 1);
        assert_eq!(read_passages[2].text, "second document");
        assert_eq!(read_passages[0].embedding.vec, vec![0.5, -0.25]);
        assert_eq!(read_passages[0].embedding.document, "first");
    }

    #[tokio::test]
    async fn test_empty_database() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("index.db")).await.unwrap();
        db.write(&[], &[]).await.unwrap();

        let (documents, passages) = db.read().await.unwrap();
        assert!(documents.is_empty());
        assert!(passages.is_empty());
    }
}
