//! Retrieval of transcript passages for a question.

use crate::embedding::Embedder;
use crate::error::{NotewiseError, Result};
use crate::models::{RetrievalResult, RetrievedPassage};
use crate::vector_store::{SearchQuery, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Finds the passages of one content item most similar to a question.
pub struct RagRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl RagRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Passage texts, best match first.
    pub async fn retrieve(
        &self,
        content_id: i64,
        question: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(content_id, question, top_k, min_score)
            .await?
            .texts())
    }

    /// Scored passages, best match first. Never returns another content's passages.
    #[instrument(skip(self, question))]
    pub async fn retrieve_scored(
        &self,
        content_id: i64,
        question: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<RetrievalResult> {
        if question.trim().is_empty() {
            return Err(NotewiseError::InvalidInput("Question is empty".to_string()));
        }
        if top_k == 0 {
            return Ok(RetrievalResult {
                content_id,
                passages: Vec::new(),
            });
        }

        let vector = self.embedder.embed(question).await?;
        let hits = self
            .store
            .search(&SearchQuery {
                vector,
                content_id,
                limit: top_k,
                score_threshold: Some(min_score),
            })
            .await?;

        let mut passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter(|hit| {
                if hit.payload.content_id != content_id {
                    warn!(
                        "Discarding point {} from content {} in search for content {}",
                        hit.id, hit.payload.content_id, content_id
                    );
                    return false;
                }
                hit.score >= min_score
            })
            .map(|hit| RetrievedPassage {
                text: hit.payload.text,
                score: hit.score,
                title: hit.payload.title,
                start_seconds: hit.payload.start_seconds,
            })
            .collect();

        passages.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        passages.truncate(top_k);

        debug!("Retrieved {} passages for content {}", passages.len(), content_id);
        Ok(RetrievalResult {
            content_id,
            passages,
        })
    }
}
