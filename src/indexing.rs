//! Indexing of content blocks into the vector store.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::ContentBlock;
use crate::vector_store::{point_id, VectorPayload, VectorRecord, VectorStore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Counts from indexing a batch of blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub failed: usize,
}

/// Embeds blocks and upserts them under deterministic point ids.
///
/// The vector is computed from the easy summary; the payload text is the
/// original transcript slice, which is what retrieval hands to the model.
pub struct ContentIndexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl ContentIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Index one block, overwriting any earlier record for the same segment.
    #[instrument(skip(self, block), fields(start = block.start_seconds))]
    pub async fn index_block(&self, content_id: i64, block: &ContentBlock) -> Result<()> {
        let id = point_id(content_id, block.start_seconds)?;

        let embed_text = [&block.summary_easy, &block.summary_hard, &block.source_text]
            .into_iter()
            .find(|t| !t.trim().is_empty())
            .map(String::as_str)
            .unwrap_or(block.title.as_str());

        let vector = self.embedder.embed(embed_text).await?;

        self.store
            .upsert(&[VectorRecord {
                id,
                vector,
                payload: VectorPayload {
                    content_id,
                    text: block.source_text.clone(),
                    title: block.title.clone(),
                    start_seconds: block.start_seconds,
                },
            }])
            .await?;

        debug!("Indexed block {} at {}s", id, block.start_seconds);
        Ok(())
    }

    /// Index every block. Failures are logged and counted, never raised.
    #[instrument(skip(self, blocks), fields(count = blocks.len()))]
    pub async fn index_all(&self, content_id: i64, blocks: &[ContentBlock]) -> IndexReport {
        let mut report = IndexReport::default();

        for block in blocks {
            match self.index_block(content_id, block).await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    warn!(
                        "Failed to index block at {}s for content {}: {}",
                        block.start_seconds, content_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            "Indexed {} blocks for content {} ({} failed)",
            report.indexed, content_id, report.failed
        );
        report
    }

    /// Drop every record of the content item, then index `blocks`.
    ///
    /// Segments that a new run no longer produces stop showing up in
    /// retrieval. A failed delete is logged and indexing still proceeds.
    #[instrument(skip(self, blocks), fields(count = blocks.len()))]
    pub async fn replace_all(&self, content_id: i64, blocks: &[ContentBlock]) -> IndexReport {
        if let Err(e) = self.store.delete_content(content_id).await {
            warn!("Failed to clear old records for content {}: {}", content_id, e);
        }
        self.index_all(content_id, blocks).await
    }
}
