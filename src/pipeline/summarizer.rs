//! Per-segment summaries and quiz items.

use crate::config::Prompts;
use crate::error::{NotewiseError, Result};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::{format_timestamp, ContentBlock, OpenItem, TrueFalseItem};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of parsing one summarization response.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockParse {
    Parsed(ContentBlock),
    Failed(String),
}

/// Writes summaries and quiz items for one transcript slice.
pub struct ChunkSummarizer {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    model_name: Option<String>,
    temperature: Option<f32>,
}

impl ChunkSummarizer {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            model_name: None,
            temperature: None,
        }
    }

    pub fn with_model_name(mut self, model_name: Option<String>) -> Self {
        self.model_name = model_name;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Summarize one slice. A response that carries no usable field is a
    /// `ChunkSummarization` error.
    #[instrument(skip(self, chunk_text), fields(chars = chunk_text.len()))]
    pub async fn summarize(
        &self,
        chunk_text: &str,
        topic_title: &str,
        start_time: u32,
    ) -> Result<ContentBlock> {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), topic_title.to_string());
        vars.insert("timestamp".to_string(), format_timestamp(start_time));
        vars.insert("chunk".to_string(), chunk_text.to_string());

        let system = self.prompts.render_with_custom(&self.prompts.summary.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.summary.user, &vars);

        let mut request = CompletionRequest::new(user).with_system(system).json_object();
        if let Some(name) = &self.model_name {
            request = request.with_model(name.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let raw = self.model.complete(&request).await?;

        match parse_block(&raw, topic_title, start_time, chunk_text) {
            BlockParse::Parsed(block) => Ok(block),
            BlockParse::Failed(reason) => {
                debug!("Unusable summary response at {}s: {}", start_time, reason);
                Err(NotewiseError::ChunkSummarization {
                    start_seconds: start_time,
                    reason,
                })
            }
        }
    }
}

/// Parse a summarization response. Missing keys leave the field unset.
pub fn parse_block(raw: &str, topic_title: &str, start_seconds: u32, source_text: &str) -> BlockParse {
    let json = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => return BlockParse::Failed("No JSON object in response".to_string()),
    };

    let object = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return BlockParse::Failed("Response is not a JSON object".to_string()),
        Err(e) => return BlockParse::Failed(format!("Invalid JSON: {}", e)),
    };

    let title = text_field(&object, &["title"]).unwrap_or_else(|| topic_title.to_string());

    let block = ContentBlock {
        title,
        start_seconds,
        source_text: source_text.to_string(),
        summary_easy: text_field(&object, &["summaryEasy", "summary_easy", "easy"]).unwrap_or_default(),
        summary_hard: text_field(&object, &["summaryHard", "summary_hard", "hard"]).unwrap_or_default(),
        true_false: field(&object, &["trueFalse", "true_false", "ox"])
            .and_then(Value::as_object)
            .and_then(true_false_item),
        open: field(&object, &["open", "openQuestion", "open_question"])
            .and_then(Value::as_object)
            .and_then(open_item),
    };

    if block.is_empty() {
        return BlockParse::Failed("Response contained no summaries or quiz items".to_string());
    }
    BlockParse::Parsed(block)
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k)).filter(|v| !v.is_null())
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(object, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn true_false_item(object: &Map<String, Value>) -> Option<TrueFalseItem> {
    let statement = text_field(object, &["statement", "question"])?;
    let answer = field(object, &["answer", "correct"]).and_then(parse_answer)?;
    Some(TrueFalseItem {
        statement,
        answer,
        explanation: text_field(object, &["explanation"]).unwrap_or_default(),
    })
}

fn open_item(object: &Map<String, Value>) -> Option<OpenItem> {
    Some(OpenItem {
        question: text_field(object, &["question"])?,
        model_answer: text_field(object, &["answer", "modelAnswer", "model_answer"])?,
    })
}

/// Accepts booleans, `"true"/"false"`, `"O"/"X"` and `"yes"/"no"`.
fn parse_answer(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "o" | "yes" => Some(true),
            "false" | "x" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    const FULL_RESPONSE: &str = r#"{
        "title": "Two's complement",
        "summaryEasy": "Negative numbers flip the bits and add one.",
        "summaryHard": "Two's complement makes subtraction reuse the adder.",
        "trueFalse": {"statement": "Two's complement has two zeros.", "answer": false, "explanation": "Only one zero exists."},
        "open": {"question": "Why add one after inverting?", "answer": "To avoid a negative zero."}
    }"#;

    #[test]
    fn test_parse_full_response() {
        let block = match parse_block(FULL_RESPONSE, "Topic", 120, "slice text") {
            BlockParse::Parsed(block) => block,
            BlockParse::Failed(reason) => panic!("parse failed: {}", reason),
        };

        let expected = ContentBlock {
            title: "Two's complement".to_string(),
            start_seconds: 120,
            source_text: "slice text".to_string(),
            summary_easy: "Negative numbers flip the bits and add one.".to_string(),
            summary_hard: "Two's complement makes subtraction reuse the adder.".to_string(),
            true_false: Some(TrueFalseItem {
                statement: "Two's complement has two zeros.".to_string(),
                answer: false,
                explanation: "Only one zero exists.".to_string(),
            }),
            open: Some(OpenItem {
                question: "Why add one after inverting?".to_string(),
                model_answer: "To avoid a negative zero.".to_string(),
            }),
        };
        assert_eq!(block, expected);
    }

    #[test]
    fn test_flexible_answers() {
        for (answer, expected) in [
            (r#""O""#, true),
            (r#""x""#, false),
            (r#""yes""#, true),
            (r#""False""#, false),
            ("true", true),
        ] {
            let raw = format!(
                r#"{{"trueFalse": {{"statement": "s", "answer": {}}}}}"#,
                answer
            );
            match parse_block(&raw, "t", 0, "") {
                BlockParse::Parsed(block) => {
                    assert_eq!(block.true_false.unwrap().answer, expected, "answer {}", answer)
                }
                BlockParse::Failed(reason) => panic!("answer {} failed: {}", answer, reason),
            }
        }
    }

    #[test]
    fn test_missing_keys_are_not_errors() {
        let raw = "```json\n{\"summaryEasy\": \"Only the easy one.\", \"open\": {\"question\": \"q\"}}\n```";
        match parse_block(raw, "Fallback title", 30, "src") {
            BlockParse::Parsed(block) => {
                assert_eq!(block.title, "Fallback title");
                assert_eq!(block.summary_easy, "Only the easy one.");
                assert!(block.summary_hard.is_empty());
                assert!(block.true_false.is_none());
                assert!(block.open.is_none());
            }
            BlockParse::Failed(reason) => panic!("parse failed: {}", reason),
        }
    }

    #[test]
    fn test_malformed_responses_fail() {
        for raw in [
            "Sorry, I cannot help with that.",
            "{\"summaryEasy\": ",
            "{\"title\": \"Only a title\"}",
            "{\"trueFalse\": {\"statement\": \"s\", \"answer\": \"maybe\"}}",
        ] {
            assert!(
                matches!(parse_block(raw, "t", 0, ""), BlockParse::Failed(_)),
                "expected failure for {:?}",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_summarize_requests_json_and_maps_failure() {
        let model = Arc::new(ScriptedModel::fixed("not json at all"));
        let summarizer = ChunkSummarizer::new(model.clone(), Prompts::default());

        let err = summarizer.summarize("the slice", "Intro", 65).await.unwrap_err();
        assert!(matches!(
            err,
            NotewiseError::ChunkSummarization { start_seconds: 65, .. }
        ));

        let requests = model.requests();
        let request = &requests[0];
        assert!(request.json_object);
        assert!(request.prompt.contains("the slice"));
        assert!(request.prompt.contains("Intro (starts at 01:05)"));
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let model = Arc::new(ScriptedModel::fixed(FULL_RESPONSE));
        let summarizer = ChunkSummarizer::new(model, Prompts::default());

        let block = summarizer.summarize("slice", "Topic", 10).await.unwrap();
        assert_eq!(block.start_seconds, 10);
        assert_eq!(block.source_text, "slice");
        assert!(block.open.is_some());
    }
}
