//! Retrieval results.

use serde::{Deserialize, Serialize};

/// One retrieved transcript passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPassage {
    pub text: String,
    pub score: f32,
    pub title: String,
    pub start_seconds: u32,
}

/// Passages for one content item, best match first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub content_id: i64,
    pub passages: Vec<RetrievedPassage>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passage texts in score order.
    pub fn texts(&self) -> Vec<String> {
        self.passages.iter().map(|p| p.text.clone()).collect()
    }
}
