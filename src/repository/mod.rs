//! Persistence of generated study material and chat history.
//!
//! The pipeline and chat only see [`ContentRepository`]; the SQLite
//! implementation backs the CLI.

mod sqlite;

pub use sqlite::SqliteRepository;

use crate::error::Result;
use crate::models::{ChatTurn, ContentBlock, Tier, TierSummary};
use async_trait::async_trait;

/// Storage for a content item's summaries, quizzes and chat turns.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Store one tier's summaries, replacing any with the same start time.
    async fn save_tier(&self, content_id: i64, tier: Tier, summaries: &[TierSummary]) -> Result<()>;

    /// Store the quiz items carried by the blocks.
    async fn save_quizzes(&self, content_id: i64, blocks: &[ContentBlock]) -> Result<usize>;

    /// Load one tier's summaries ordered by start time.
    async fn summaries(&self, content_id: i64, tier: Tier) -> Result<Vec<TierSummary>>;

    /// Append a chat turn to the content's history.
    async fn append_turn(&self, content_id: i64, turn: &ChatTurn) -> Result<()>;

    /// The most recent `limit` turns, oldest first.
    async fn recent_turns(&self, content_id: i64, limit: usize) -> Result<Vec<ChatTurn>>;
}
