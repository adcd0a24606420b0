//! In-process search index.
//!
//! Keeps records in memory and fuses a keyword ranking with a vector
//! ranking using Reciprocal Rank Fusion: `score = Σ 1 / (RRF_K + rank)`.
//! Useful for local runs and tests; contents are lost when the process
//! exits.

use super::{cosine_similarity, RecordAck, SearchHit, SearchIndex, VectorRecord};
use easydocs_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// RRF smoothing constant.
const RRF_K: f32 = 60.0;

#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error() -> AppError {
    AppError::Other("Memory index lock poisoned".to_string())
}

fn terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Record positions with at least one query term, by descending term hits.
fn keyword_ranking(records: &[VectorRecord], query: &str) -> Vec<usize> {
    let query_terms: HashSet<String> = terms(query).into_iter().collect();
    if query_terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize)> = records
        .iter()
        .enumerate()
        .filter_map(|(pos, record)| {
            let hits = terms(&record.content)
                .iter()
                .filter(|t| query_terms.contains(*t))
                .count();
            (hits > 0).then_some((pos, hits))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(pos, _)| pos).collect()
}

/// Record positions with positive similarity, most similar first.
fn vector_ranking(records: &[VectorRecord], vector: &[f32]) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = records
        .iter()
        .enumerate()
        .map(|(pos, record)| (pos, cosine_similarity(&record.vector, vector)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(pos, _)| pos).collect()
}

fn fuse(rankings: &[Vec<usize>]) -> Vec<(usize, f32)> {
    let mut scores: HashMap<usize, f32> = HashMap::new();
    for ranking in rankings {
        for (rank, pos) in ranking.iter().enumerate() {
            *scores.entry(*pos).or_insert(0.0) += 1.0 / (RRF_K + rank as f32 + 1.0);
        }
    }

    let mut fused: Vec<(usize, f32)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    fused
}

#[async_trait::async_trait]
impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<Vec<RecordAck>> {
        let mut stored = self.records.write().map_err(|_| lock_error())?;
        let mut acks = Vec::with_capacity(records.len());

        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
            acks.push(RecordAck::written(&record.id));
        }

        Ok(acks)
    }

    async fn hybrid_search(
        &self,
        query: &str,
        vector: &[f32],
        k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        let stored = self.records.read().map_err(|_| lock_error())?;
        if stored.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let rankings = [keyword_ranking(&stored, query), vector_ranking(&stored, vector)];

        Ok(fuse(&rankings)
            .into_iter()
            .take(k)
            .map(|(pos, score)| {
                let record = &stored[pos];
                SearchHit {
                    id: record.id.clone(),
                    title: record.title.clone(),
                    content: record.content.clone(),
                    score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            title: "doc.pdf".to_string(),
            content: content.to_string(),
            vector,
        }
    }

    async fn seeded() -> MemoryIndex {
        let index = MemoryIndex::new();
        index
            .upsert(&[
                record("rent", "Rent is due on the first day of each month", vec![1.0, 0.0, 0.0]),
                record("term", "Termination requires sixty days notice", vec![0.0, 1.0, 0.0]),
                record("pets", "Pets are not allowed on the premises", vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = MemoryIndex::new();
        let hits = index.hybrid_search("rent", &[1.0, 0.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_and_vector_agreement_ranks_first() {
        let index = seeded().await;
        let hits = index
            .hybrid_search("termination notice", &[0.0, 1.0, 0.0], 3)
            .await
            .unwrap();

        assert_eq!(hits[0].id, "term");
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_fusion_blends_both_rankings() {
        let index = seeded().await;
        // keyword favours "pets", vector favours "rent"
        let hits = index
            .hybrid_search("pets premises", &[0.9, 0.0, 0.1], 3)
            .await
            .unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(hits.len(), 2);
        assert!(ids.contains(&"pets"));
        assert!(ids.contains(&"rent"));
        assert_eq!(ids[0], "pets");
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = seeded().await;
        index
            .upsert(&[record("rent", "Rent is due weekly", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        let hits = index.hybrid_search("weekly", &[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].content, "Rent is due weekly");
    }

    #[tokio::test]
    async fn test_respects_k() {
        let index = seeded().await;
        let hits = index
            .hybrid_search("the", &[0.5, 0.5, 0.5], 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }
}
