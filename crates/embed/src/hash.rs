//! Deterministic hash-based embedding provider.

use crate::provider::EmbeddingProvider;
use recall_core::RecallResult;
use std::collections::{HashMap, HashSet};

/// Hash-based embedding provider for local, offline operation.
///
/// Maps words and their character trigrams onto fixed dimensions by hashing.
/// Not semantically accurate like a neural model, but deterministic and
/// content-dependent, which is what tests and offline runs need: identical
/// text always yields the identical vector, and texts sharing vocabulary
/// score closer than unrelated ones.
#[derive(Debug)]
pub struct HashProvider {
    dimensions: usize,
}

/// Common words carrying no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

impl HashProvider {
    /// Create a new hash provider with the specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // whole-word dimension, weighted by raw frequency
            let dim = (fold_hash(word.as_bytes(), 31) as usize) % self.dimensions;
            embedding[dim] += *freq as f32;

            // trigram dimensions, sqrt-weighted so long words don't dominate
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim = (fold_hash(trigram.as_bytes(), 37) as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }
        }

        // normalize to unit length
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn fold_hash(bytes: &[u8], mult: u64) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, b| acc.wrapping_mul(mult).wrapping_add(*b as u64))
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "hash-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> RecallResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_provider_metadata() {
        let provider = HashProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "hash");
        assert_eq!(provider.model_name(), "hash-v1");
    }

    #[tokio::test]
    async fn test_embed_is_unit_length() {
        let provider = HashProvider::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embed_deterministic() {
        let provider = HashProvider::new(384);
        let text = "workflow PO12345 approved by manager";

        let a = provider.embed(text).await.unwrap();
        let b = provider.embed(text).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = HashProvider::new(384);

        let a = provider.embed("incident escalated overnight").await.unwrap();
        let b = provider.embed("invoice paid on time").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_closer() {
        let provider = HashProvider::new(384);

        let query = provider.embed("recent actions for PO12345").await.unwrap();
        let related = provider.embed("approved PO12345").await.unwrap();
        let unrelated = provider.embed("quarterly revenue dashboard").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashProvider::new(384);
        let embedding = provider.embed("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let provider = HashProvider::new(128);
        let texts = vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 128);
        }
    }

    #[tokio::test]
    async fn test_multibyte_text() {
        let provider = HashProvider::new(384);
        let embedding = provider.embed("ordem de compra atrasada no café").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
