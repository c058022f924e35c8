use crate::processor::ChunkOptions;

/// Retrieval and chunking settings for collection indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of passages retrieved per query
    pub top_k: usize,

    /// How documents are split into passages
    pub chunk_options: ChunkOptions,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            chunk_options: ChunkOptions::default(),
        }
    }
}

impl IndexConfig {
    /// Set the number of retrieved passages
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the chunk options
    pub fn with_chunk_options(mut self, chunk_options: ChunkOptions) -> Self {
        self.chunk_options = chunk_options;
        self
    }
}
