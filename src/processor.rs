//! Passage chunking for the index
//!
//! Documents are split into overlapping word windows before embedding. Splits
//! prefer paragraph breaks, then line breaks, then sentence ends, so a passage
//! reads as a coherent piece of its document.

mod chunking;
mod config;

pub use chunking::{TextChunk, chunk_text};
pub use config::ChunkOptions;
