//! Pipeline coordination for a single content item.

use super::{Cancellation, ChunkSummarizer, TopicSegmenter};
use crate::config::{PipelineSettings, ProcessingMode};
use crate::error::{NotewiseError, Result};
use crate::events::TaskProgress;
use crate::indexing::{ContentIndexer, IndexReport};
use crate::models::{partition_by_tier, ContentBlock, Tier, TierSummary, TopicBoundary, Transcript};
use crate::repository::ContentRepository;
use crate::vector_store::point_id;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub content_id: i64,
    pub boundaries: Vec<TopicBoundary>,
    /// Blocks sorted by start time.
    pub blocks: Vec<ContentBlock>,
    /// Slices whose summarization failed.
    pub dropped_chunks: usize,
    /// Boundaries whose slice had no transcript lines.
    pub skipped_slices: usize,
    /// Blocks indexed before the run returned. Zero when indexing was detached.
    pub indexed: usize,
    pub index_failures: usize,
    /// Error of the first dropped slice, kept so callers can tell a quota or
    /// auth outage from a malformed response.
    pub first_failure: Option<String>,
    /// The run was cancelled or hit its deadline before every slice finished.
    pub cancelled: bool,
}

impl PipelineResult {
    /// Summaries for one tier, in start order.
    pub fn tier(&self, tier: Tier) -> Vec<TierSummary> {
        partition_by_tier(&self.blocks, tier)
    }
}

/// Runs segmentation, summarization, persistence and indexing.
pub struct PipelineCoordinator {
    segmenter: TopicSegmenter,
    summarizer: ChunkSummarizer,
    indexer: Arc<ContentIndexer>,
    repository: Arc<dyn ContentRepository>,
    settings: PipelineSettings,
    active: Arc<Mutex<HashSet<i64>>>,
}

impl PipelineCoordinator {
    pub fn new(
        segmenter: TopicSegmenter,
        summarizer: ChunkSummarizer,
        indexer: Arc<ContentIndexer>,
        repository: Arc<dyn ContentRepository>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            segmenter,
            summarizer,
            indexer,
            repository,
            settings,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run the pipeline to completion.
    pub async fn run_pipeline(&self, content_id: i64, transcript: &Transcript) -> Result<PipelineResult> {
        self.run(content_id, transcript, &Cancellation::new(), None).await
    }

    /// Run the pipeline, stopping early when `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        content_id: i64,
        transcript: &Transcript,
        cancel: &Cancellation,
    ) -> Result<PipelineResult> {
        self.run(content_id, transcript, cancel, None).await
    }

    /// Run the pipeline, reporting stage completion to `progress`.
    ///
    /// Cancellation or the run deadline during segmentation fails the run.
    /// Later, in-flight summaries are dropped and the finished blocks are
    /// still persisted and indexed.
    #[instrument(skip(self, transcript, cancel, progress), fields(lines = transcript.lines().len()))]
    pub async fn run(
        &self,
        content_id: i64,
        transcript: &Transcript,
        cancel: &Cancellation,
        progress: Option<&TaskProgress>,
    ) -> Result<PipelineResult> {
        if transcript.is_empty() {
            return Err(NotewiseError::InvalidInput("Transcript has no lines".to_string()));
        }
        point_id(content_id, 0)?;

        let guard = RunGuard::acquire(&self.active, content_id)?;
        let deadline = (self.settings.run_timeout_secs > 0)
            .then(|| Instant::now() + Duration::from_secs(self.settings.run_timeout_secs));

        info!("Segmenting transcript for content {}", content_id);
        let boundaries = tokio::select! {
            result = self.segmenter.segment(transcript) => result?,
            _ = cancel.cancelled() => return Err(NotewiseError::Cancelled),
            _ = deadline_elapsed(deadline) => {
                return Err(NotewiseError::Timeout("Run deadline passed during segmentation".to_string()))
            }
        };
        report(progress, format!("Segmentation done: {} topics", boundaries.len()));

        let mut skipped_slices = 0;
        let mut slices = Vec::with_capacity(boundaries.len());
        for (idx, boundary) in boundaries.iter().enumerate() {
            let end = boundaries.get(idx + 1).map(|next| next.start_seconds);
            let text = transcript.slice_text(boundary.start_seconds, end);
            if text.trim().is_empty() {
                info!("Skipping empty slice for '{}' at {}s", boundary.title, boundary.start_seconds);
                skipped_slices += 1;
                continue;
            }
            slices.push((boundary, text));
        }

        let mut blocks = Vec::with_capacity(slices.len());
        let mut dropped_chunks = 0;
        let mut first_failure = None;
        let mut cancelled = false;

        let mut summaries = stream::iter(slices)
            .map(|(boundary, text)| async move {
                let result = self
                    .summarizer
                    .summarize(&text, &boundary.title, boundary.start_seconds)
                    .await;
                (boundary.start_seconds, result)
            })
            .buffer_unordered(self.settings.max_concurrent_chunks.max(1));

        loop {
            tokio::select! {
                next = summaries.next() => match next {
                    Some((_, Ok(block))) => blocks.push(block),
                    Some((start, Err(e))) => {
                        warn!("Dropping chunk at {}s: {}", start, e);
                        dropped_chunks += 1;
                        first_failure.get_or_insert_with(|| e.to_string());
                    }
                    None => break,
                },
                _ = cancel.cancelled() => {
                    warn!("Run for content {} cancelled with {} blocks done", content_id, blocks.len());
                    cancelled = true;
                    break;
                }
                _ = deadline_elapsed(deadline) => {
                    warn!("Run for content {} hit its deadline with {} blocks done", content_id, blocks.len());
                    cancelled = true;
                    break;
                }
            }
        }
        drop(summaries);

        blocks.sort_by_key(|b| b.start_seconds);
        report(progress, format!("Summaries done: {} blocks", blocks.len()));

        for tier in Tier::ALL {
            self.repository
                .save_tier(content_id, tier, &partition_by_tier(&blocks, tier))
                .await?;
        }
        self.repository.save_quizzes(content_id, &blocks).await?;

        // Only a run where every slice succeeded replaces the content's
        // records; a partial one adds to them.
        let replace = !cancelled && dropped_chunks == 0;
        let (indexed, index_failures) = match self.settings.processing_mode {
            ProcessingMode::Internal => {
                let outcome = index_blocks(&self.indexer, content_id, &blocks, replace).await;
                report(progress, format!("Indexing done: {} blocks", outcome.indexed));
                (outcome.indexed, outcome.failed)
            }
            ProcessingMode::External => {
                let indexer = self.indexer.clone();
                let pending = blocks.clone();
                // The guard moves along so the id stays busy until indexing ends.
                tokio::spawn(async move {
                    index_blocks(&indexer, content_id, &pending, replace).await;
                    drop(guard);
                });
                report(progress, "Indexing handed off");
                (0, 0)
            }
        };

        info!(
            "Pipeline for content {} produced {} blocks ({} dropped, {} empty slices)",
            content_id,
            blocks.len(),
            dropped_chunks,
            skipped_slices
        );

        Ok(PipelineResult {
            content_id,
            boundaries,
            blocks,
            dropped_chunks,
            skipped_slices,
            indexed,
            index_failures,
            first_failure,
            cancelled,
        })
    }
}

fn report(progress: Option<&TaskProgress>, message: impl Into<String>) {
    if let Some(progress) = progress {
        progress.progress(message);
    }
}

async fn index_blocks(
    indexer: &ContentIndexer,
    content_id: i64,
    blocks: &[ContentBlock],
    replace: bool,
) -> IndexReport {
    if replace {
        indexer.replace_all(content_id, blocks).await
    } else {
        indexer.index_all(content_id, blocks).await
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Marks a content id as running until dropped.
struct RunGuard {
    active: Arc<Mutex<HashSet<i64>>>,
    content_id: i64,
}

impl RunGuard {
    fn acquire(active: &Arc<Mutex<HashSet<i64>>>, content_id: i64) -> Result<Self> {
        let mut running = active.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(content_id) {
            return Err(NotewiseError::AlreadyRunning(content_id));
        }
        Ok(Self {
            active: active.clone(),
            content_id,
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut running = self.active.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(&self.content_id);
    }
}
