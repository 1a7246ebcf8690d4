//! Vector store abstraction for Notewise.
//!
//! Every search is scoped to one content item: [`SearchQuery`] carries a
//! mandatory content id that backends must apply as a hard filter.

mod memory;
mod qdrant;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantVectorStore;

use crate::error::{NotewiseError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Bits of a point id reserved for the segment start time.
const START_BITS: u32 = 24;
/// Largest content id that fits beside the start time in a point id.
pub const MAX_CONTENT_ID: i64 = (1i64 << (63 - START_BITS)) - 1;

/// Derive the point id for a segment of a content item.
///
/// The same `(content_id, start_seconds)` always yields the same id, so
/// re-indexing a segment overwrites its previous record.
pub fn point_id(content_id: i64, start_seconds: u32) -> Result<u64> {
    if !(0..=MAX_CONTENT_ID).contains(&content_id) {
        return Err(NotewiseError::InvalidInput(format!(
            "Content id {} is outside the indexable range",
            content_id
        )));
    }
    if start_seconds >= (1 << START_BITS) {
        return Err(NotewiseError::InvalidInput(format!(
            "Segment start {}s is outside the indexable range",
            start_seconds
        )));
    }
    Ok(((content_id as u64) << START_BITS) | start_seconds as u64)
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorPayload {
    pub content_id: i64,
    /// Text returned as retrieval context.
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_seconds: u32,
}

/// A vector with its id and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: VectorPayload,
}

/// A similarity search limited to one content item.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub content_id: i64,
    pub limit: usize,
    pub score_threshold: Option<f32>,
}

/// A search hit with score.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: u64,
    /// Similarity score (higher is better).
    pub score: f32,
    pub payload: VectorPayload,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite records by id.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Search one content item's vectors, best match first.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ScoredPoint>>;

    /// Delete every record belonging to a content item.
    async fn delete_content(&self, content_id: i64) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
