//! Study material produced by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a topic begins in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicBoundary {
    pub title: String,
    pub start_seconds: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl TopicBoundary {
    pub fn new(title: impl Into<String>, start_seconds: u32) -> Self {
        Self {
            title: title.into(),
            start_seconds,
            keywords: Vec::new(),
        }
    }
}

/// A true/false quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseItem {
    pub statement: String,
    pub answer: bool,
    #[serde(default)]
    pub explanation: String,
}

/// An open-response quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenItem {
    pub question: String,
    pub model_answer: String,
}

/// Summaries and quiz items for one topic segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub title: String,
    pub start_seconds: u32,
    /// The transcript slice this block was written from.
    pub source_text: String,
    pub summary_easy: String,
    pub summary_hard: String,
    pub true_false: Option<TrueFalseItem>,
    pub open: Option<OpenItem>,
}

impl ContentBlock {
    /// True when the model provided none of the generated fields.
    pub fn is_empty(&self) -> bool {
        self.summary_easy.trim().is_empty()
            && self.summary_hard.trim().is_empty()
            && self.true_false.is_none()
            && self.open.is_none()
    }

    pub fn summary(&self, tier: Tier) -> &str {
        match tier {
            Tier::Easy => &self.summary_easy,
            Tier::Hard => &self.summary_hard,
        }
    }
}

/// Difficulty tier of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Hard,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Easy, Tier::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "hard" => Ok(Tier::Hard),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// One tier's summary of one segment, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    pub tier: Tier,
    pub title: String,
    pub start_seconds: u32,
    pub summary: String,
}

/// Split blocks into per-tier summaries, skipping empty summaries.
pub fn partition_by_tier(blocks: &[ContentBlock], tier: Tier) -> Vec<TierSummary> {
    blocks
        .iter()
        .filter(|b| !b.summary(tier).trim().is_empty())
        .map(|b| TierSummary {
            tier,
            title: b.title.clone(),
            start_seconds: b.start_seconds,
            summary: b.summary(tier).to_string(),
        })
        .collect()
}

/// A question and its answer in a content's chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: u32, easy: &str, hard: &str) -> ContentBlock {
        ContentBlock {
            title: format!("Block {}", start),
            start_seconds: start,
            source_text: "source".to_string(),
            summary_easy: easy.to_string(),
            summary_hard: hard.to_string(),
            true_false: None,
            open: None,
        }
    }

    #[test]
    fn test_partition_by_tier() {
        let blocks = vec![block(0, "easy a", "hard a"), block(60, "easy b", "")];

        let easy = partition_by_tier(&blocks, Tier::Easy);
        let hard = partition_by_tier(&blocks, Tier::Hard);

        assert_eq!(easy.len(), 2);
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].start_seconds, 0);
        assert_eq!(easy[1].summary, "easy b");
    }

    #[test]
    fn test_empty_block_detection() {
        assert!(block(0, " ", "").is_empty());
        assert!(!block(0, "", "hard").is_empty());
    }
}
