//! In-memory vector store implementation.
//!
//! Useful for testing and one-off runs.

use super::{cosine_similarity, ScoredPoint, SearchQuery, VectorRecord, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<u64, VectorRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut store = self.records.write().unwrap();
        for record in records {
            store.insert(record.id, record.clone());
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredPoint>> {
        let records = self.records.read().unwrap();
        let min_score = query.score_threshold.unwrap_or(f32::MIN);

        let mut results: Vec<ScoredPoint> = records
            .values()
            .filter(|r| r.payload.content_id == query.content_id)
            .map(|r| ScoredPoint {
                id: r.id,
                score: cosine_similarity(&query.vector, &r.vector),
                payload: r.payload.clone(),
            })
            .filter(|p| p.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(query.limit);

        Ok(results)
    }

    async fn delete_content(&self, content_id: i64) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.retain(|_, r| r.payload.content_id != content_id);
        Ok(())
    }
}
