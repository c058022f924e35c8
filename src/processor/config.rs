/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Target size of each chunk in words
    pub target_chunk_size: usize,

    /// Size of overlap between chunks in words
    pub overlap_size: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            target_chunk_size: 256,
            overlap_size: 32,
        }
    }
}

impl ChunkOptions {
    /// Set the target chunk size
    pub fn with_target_chunk_size(mut self, target_chunk_size: usize) -> Self {
        self.target_chunk_size = target_chunk_size;
        self
    }

    /// Set the overlap size
    pub fn with_overlap_size(mut self, overlap_size: usize) -> Self {
        self.overlap_size = overlap_size;
        self
    }

    /// Window and overlap clamped so every window advances by at least one word
    pub(crate) fn effective(&self) -> (usize, usize) {
        let target = self.target_chunk_size.max(1);
        (target, self.overlap_size.min(target - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_clamps_overlap() {
        assert_eq!(ChunkOptions::default().effective(), (256, 32));

        let options = ChunkOptions::default()
            .with_target_chunk_size(4)
            .with_overlap_size(10);
        assert_eq!(options.effective(), (4, 3));

        let options = ChunkOptions::default().with_target_chunk_size(0);
        assert_eq!(options.effective(), (1, 0));
    }
}
