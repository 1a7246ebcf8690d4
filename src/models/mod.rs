//! Data model shared across the pipeline and retrieval.

mod content;
mod retrieval;
mod transcript;

pub use content::{
    partition_by_tier, ChatTurn, ContentBlock, OpenItem, Tier, TierSummary, TopicBoundary,
    TrueFalseItem,
};
pub use retrieval::{RetrievalResult, RetrievedPassage};
pub use transcript::{format_timestamp, parse_clock, Transcript, TranscriptLine};
