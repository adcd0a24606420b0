//! Offline embedding provider based on hashed character trigrams.
//!
//! Vectors are deterministic and content-dependent: texts sharing words
//! land near each other. Used for local runs with the in-memory index and
//! in tests; it has no semantic understanding.

use crate::embeddings::provider::EmbeddingProvider;
use easydocs_core::AppResult;
use std::collections::{HashMap, HashSet};

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "shall", "will", "may",
];

#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

fn bucket(token: &str, multiplier: u64, dimensions: usize) -> usize {
    let hash = token
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

/// Unit-length embedding of `text`; all zeros when no word survives filtering.
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut embedding = vec![0.0f32; dimensions];
    if dimensions == 0 {
        return embedding;
    }

    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let lower = text.to_lowercase();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !stop.contains(w))
    {
        *counts.entry(word).or_insert(0) += 1;
    }

    for (word, count) in &counts {
        let chars: Vec<char> = word.chars().collect();
        for trigram in chars.windows(3) {
            let trigram: String = trigram.iter().collect();
            embedding[bucket(&trigram, 37, dimensions)] += (*count as f32).sqrt();
        }
        embedding[bucket(word, 31, dimensions)] += *count as f32;
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        embedding.iter_mut().for_each(|v| *v /= norm);
    }

    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| hash_embedding(text, self.dimensions))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::cosine_similarity;

    #[tokio::test]
    async fn test_returns_one_vector_per_input() {
        let provider = MockProvider::new(64);
        let texts = vec!["rent is due monthly".to_string(), "termination".to_string()];
        let vectors = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[test]
    fn test_embedding_is_deterministic_and_normalized() {
        let a = hash_embedding("The tenant pays rent", 128);
        let b = hash_embedding("The tenant pays rent", 128);
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_texts_score_higher() {
        let query = hash_embedding("termination notice period", 256);
        let related = hash_embedding("Either party may give termination notice", 256);
        let unrelated = hash_embedding("Rent payable by bank transfer", 256);

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_stop_words_only_is_zero_vector() {
        assert!(hash_embedding("the and of", 16).iter().all(|v| *v == 0.0));
    }
}
