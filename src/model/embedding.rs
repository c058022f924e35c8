use rig::embeddings::Embedding;

/// Conversions between `Embedding` and its persisted form
///
/// Vectors are persisted as little-endian `f32`. `quantized` rounds an
/// in-memory embedding to the same precision so a reloaded index scores
/// exactly like the one that was written.
pub trait EmbeddingConversion {
    fn to_vec(&self) -> Vec<f32>;
    fn from_vec(vec: Vec<f32>) -> Self;
    fn to_binary(&self) -> Vec<u8>;
    fn from_binary(binary: &[u8]) -> Self;
    fn quantized(&self) -> Self;
}

impl EmbeddingConversion for Embedding {
    fn to_vec(&self) -> Vec<f32> {
        self.vec.iter().map(|f| *f as f32).collect()
    }

    fn from_vec(vec: Vec<f32>) -> Self {
        Self {
            vec: vec.into_iter().map(|f| f as f64).collect(),
            document: String::new(),
        }
    }

    fn to_binary(&self) -> Vec<u8> {
        self.vec
            .iter()
            .flat_map(|f| (*f as f32).to_le_bytes())
            .collect()
    }

    fn from_binary(binary: &[u8]) -> Self {
        let vec = binary
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::from_vec(vec)
    }

    fn quantized(&self) -> Self {
        let mut embedding = Self::from_vec(self.to_vec());
        embedding.document = self.document.clone();
        embedding
    }
}

/// Cosine similarity of two vectors, 0.0 when either is all zeros
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_conversion() {
        let original_vec = vec![1.0, 2.0, 3.0];
        let embedding = Embedding::from_vec(original_vec.clone());

        assert_eq!(embedding.to_vec(), original_vec);

        let binary = embedding.to_binary();
        assert_eq!(binary.len(), 12);
        let recovered = Embedding::from_binary(&binary);
        assert_eq!(recovered.to_vec(), original_vec);
    }

    #[test]
    fn test_quantized_survives_binary_round_trip() {
        let embedding = Embedding {
            document: "text".to_string(),
            vec: vec![0.1, 1.0 / 3.0, -2.718281828459045],
        };

        let quantized = embedding.quantized();
        assert_eq!(quantized.document, "text");

        let reloaded = Embedding::from_binary(&quantized.to_binary());
        assert_eq!(reloaded.vec, quantized.vec);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
