//! # Database Schema Module
//!
//! Two tables hold a collection index:
//! 1. `documents` - the normalized documents, metadata as a JSON object
//! 2. `passages` - chunks of those documents with their `f32` embedding blobs
//!
//! Row ids are the in-memory positions, so reading rows in id order restores the
//! index exactly.

use crate::index::error::IndexError;
use libsql::{Connection, params};

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection) -> Result<(), IndexError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            metadata TEXT NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| IndexError::Schema(format!("Failed to create documents table: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS passages (
            id INTEGER PRIMARY KEY,
            document_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        )",
        params![],
    )
    .await
    .map_err(|e| IndexError::Schema(format!("Failed to create passages table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_passages_document_id ON passages(document_id)",
        params![],
    )
    .await
    .map_err(|e| IndexError::Schema(format!("Failed to create index on passages: {}", e)))?;

    Ok(())
}
