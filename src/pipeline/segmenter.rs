//! Topic segmentation of a transcript.
//!
//! The model is asked for a JSON array of topic start times. Its output is not
//! trusted: fences and prose are scrubbed, each entry is parsed on its own, and
//! the surviving boundaries are sorted, deduplicated and clamped to the
//! transcript.

use crate::config::Prompts;
use crate::error::{NotewiseError, Result};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{format_timestamp, parse_clock, TopicBoundary, Transcript};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Splits a transcript into topic boundaries using a language model.
pub struct TopicSegmenter {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    model_name: Option<String>,
    temperature: Option<f32>,
    min_topics: u32,
    max_topics: u32,
}

impl TopicSegmenter {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            model_name: None,
            temperature: None,
            min_topics: 3,
            max_topics: 6,
        }
    }

    /// Set how many topics the model is asked for.
    pub fn with_topic_range(mut self, min_topics: u32, max_topics: u32) -> Self {
        self.min_topics = min_topics.max(1);
        self.max_topics = max_topics.max(self.min_topics);
        self
    }

    /// Use a different model than the language model's default.
    pub fn with_model_name(mut self, model_name: Option<String>) -> Self {
        self.model_name = model_name;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask the model for topic boundaries and validate them.
    #[instrument(skip_all, fields(lines = transcript.lines().len()))]
    pub async fn segment(&self, transcript: &Transcript) -> Result<Vec<TopicBoundary>> {
        if transcript.is_empty() {
            return Err(NotewiseError::InvalidInput("Transcript has no lines".to_string()));
        }

        let mut vars = HashMap::new();
        vars.insert("min_topics".to_string(), self.min_topics.to_string());
        vars.insert("max_topics".to_string(), self.max_topics.to_string());
        vars.insert(
            "duration".to_string(),
            format_timestamp(transcript.last_start_seconds()),
        );
        vars.insert("transcript".to_string(), transcript.format_with_timestamps());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.segmentation.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.segmentation.user, &vars);

        let mut request = CompletionRequest::new(user).with_system(system);
        if let Some(name) = &self.model_name {
            request = request.with_model(name.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let raw = self.model.complete(&request).await?;
        debug!("Segmentation response: {}", preview(&raw, 500));

        let boundaries = parse_boundaries(&raw, transcript.last_start_seconds())?;
        info!("Segmented transcript into {} topics", boundaries.len());
        Ok(boundaries)
    }
}

#[derive(Debug, Deserialize)]
struct RawBoundary {
    #[serde(default)]
    title: Value,
    #[serde(default, alias = "start", alias = "startSeconds", alias = "start_seconds")]
    time: Value,
    #[serde(default)]
    keywords: Value,
}

/// Parse a segmentation response into a strictly ascending boundary list.
///
/// Boundaries starting after `last_start` (the last transcript line) are
/// dropped, as are duplicates of an earlier start time.
pub fn parse_boundaries(raw: &str, last_start: u32) -> Result<Vec<TopicBoundary>> {
    let json = extract_array(raw).ok_or_else(|| {
        NotewiseError::SegmentationParse(format!(
            "No JSON array in response: {}",
            preview(raw, 200)
        ))
    })?;

    let entries: Vec<Value> = serde_json::from_str(json).map_err(|e| {
        NotewiseError::SegmentationParse(format!("{}. Response was: {}", e, preview(raw, 200)))
    })?;

    let mut boundaries: Vec<TopicBoundary> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let raw: RawBoundary = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("Skipping segmentation entry {}: {}", idx, e);
                    return None;
                }
            };
            let start_seconds = seconds_from_value(&raw.time)?;
            let title = match raw.title.as_str().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => format!("Topic {}", idx + 1),
            };
            let keywords = match raw.keywords {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|k| k.as_str())
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect(),
                _ => Vec::new(),
            };
            Some(TopicBoundary {
                title,
                start_seconds,
                keywords,
            })
        })
        .filter(|b| b.start_seconds <= last_start)
        .collect();

    boundaries.sort_by_key(|b| b.start_seconds);
    boundaries.dedup_by_key(|b| b.start_seconds);

    if boundaries.is_empty() {
        return Err(NotewiseError::SegmentationParse(
            "Response contained no usable topic boundaries".to_string(),
        ));
    }

    Ok(boundaries)
}

/// Span from the first `[` to the last `]`.
fn extract_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

/// Seconds from an integer, a float, or a clock string.
fn seconds_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            (secs >= 0.0 && secs <= u32::MAX as f64).then(|| secs.floor() as u32)
        }
        Value::String(s) => {
            let s = s.trim();
            parse_clock(s).or_else(|| {
                let secs: f64 = s.parse().ok()?;
                (secs >= 0.0 && secs <= u32::MAX as f64).then(|| secs.floor() as u32)
            })
        }
        _ => None,
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TranscriptLine;
    use crate::test_support::ScriptedModel;

    #[test]
    fn test_parse_plain_array() {
        let raw = r#"[
            {"title": "Intro", "time": 0},
            {"title": "Binary", "time": 120, "keywords": ["bits", 3]}
        ]"#;

        let boundaries = parse_boundaries(raw, 600).unwrap();
        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[1].title, "Binary");
        assert_eq!(boundaries[1].keywords, vec!["bits".to_string()]);
    }

    #[test]
    fn test_parse_fenced_response_with_clock_times() {
        let raw = r#"Sure! Here are the topics:

```json
[
  {"title": "Setup", "time": "01:30"},
  {"title": "Deep dive", "time": "1:02:03"},
  {"title": "Float time", "time": 45.7}
]
```
Let me know if you need more."#;

        let boundaries = parse_boundaries(raw, 10_000).unwrap();
        let starts: Vec<u32> = boundaries.iter().map(|b| b.start_seconds).collect();
        assert_eq!(starts, vec![45, 90, 3723]);
    }

    #[test]
    fn test_output_is_strictly_ascending() {
        let raw = r#"[
            {"title": "C", "time": 300},
            {"title": "A", "time": 30},
            {"title": "A again", "time": 30},
            {"title": "B", "time": 120},
            {"title": "Past the end", "time": 5000},
            {"title": "Broken", "time": "soon"},
            "not an object"
        ]"#;

        let boundaries = parse_boundaries(raw, 600).unwrap();
        let starts: Vec<u32> = boundaries.iter().map(|b| b.start_seconds).collect();
        assert_eq!(starts, vec![30, 120, 300]);
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(boundaries[0].title, "A");
    }

    #[test]
    fn test_missing_title_gets_placeholder() {
        let boundaries = parse_boundaries(r#"[{"time": 10}]"#, 100).unwrap();
        assert_eq!(boundaries[0].title, "Topic 1");
    }

    #[test]
    fn test_parse_failures_are_segmentation_errors() {
        for raw in [
            "I could not find any topics.",
            "[{\"title\": \"unterminated\"",
            "[]",
            r#"[{"title": "Too late", "time": 9999}]"#,
        ] {
            let err = parse_boundaries(raw, 600).unwrap_err();
            assert!(
                matches!(err, NotewiseError::SegmentationParse(_)),
                "unexpected error for {:?}: {:?}",
                raw,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_segment_renders_prompt() {
        let model = Arc::new(ScriptedModel::fixed(r#"[{"title": "Only", "time": 30}]"#));
        let segmenter = TopicSegmenter::new(model.clone(), Prompts::default())
            .with_topic_range(2, 4)
            .with_model_name(Some("gpt-4o".to_string()));

        let transcript = Transcript::new(vec![
            TranscriptLine::new(0, "intro"),
            TranscriptLine::new(30, "topic X starts"),
        ]);

        let boundaries = segmenter.segment(&transcript).await.unwrap();
        assert_eq!(boundaries, vec![TopicBoundary::new("Only", 30)]);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("between 2 and 4 topics"));
        assert!(requests[0].prompt.contains("[00:30] topic X starts"));
        assert_eq!(requests[0].model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn test_segment_rejects_empty_transcript() {
        let model = Arc::new(ScriptedModel::fixed("[]"));
        let segmenter = TopicSegmenter::new(model.clone(), Prompts::default());

        let err = segmenter.segment(&Transcript::default()).await.unwrap_err();
        assert!(matches!(err, NotewiseError::InvalidInput(_)));
        assert_eq!(model.calls(), 0);
    }
}
