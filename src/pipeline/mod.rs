//! Summarization pipeline: topic segmentation, parallel chunk summaries,
//! persistence and indexing.

mod coordinator;
mod segmenter;
mod summarizer;

pub use coordinator::{PipelineCoordinator, PipelineResult};
pub use segmenter::{parse_boundaries, TopicSegmenter};
pub use summarizer::{parse_block, BlockParse, ChunkSummarizer};

use std::sync::Arc;
use tokio::sync::watch;

/// Cooperative cancellation handle shared between a run and its controller.
#[derive(Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
