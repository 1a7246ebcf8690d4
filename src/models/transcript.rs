//! Transcript input model.

use crate::error::{NotewiseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One timestamped line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    /// Start time in whole seconds.
    #[serde(alias = "start_seconds", alias = "time")]
    pub start_time_seconds: u32,
    /// Spoken text.
    pub text: String,
}

impl TranscriptLine {
    pub fn new(start_time_seconds: u32, text: impl Into<String>) -> Self {
        Self {
            start_time_seconds,
            text: text.into(),
        }
    }
}

/// A complete transcript, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TranscriptLine>", into = "Vec<TranscriptLine>")]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl From<Vec<TranscriptLine>> for Transcript {
    fn from(lines: Vec<TranscriptLine>) -> Self {
        Self::new(lines)
    }
}

impl From<Transcript> for Vec<TranscriptLine> {
    fn from(transcript: Transcript) -> Self {
        transcript.lines
    }
}

impl Transcript {
    /// Create a transcript from lines. Lines are stably sorted by start time
    /// and blank lines are dropped.
    pub fn new(mut lines: Vec<TranscriptLine>) -> Self {
        lines.retain(|l| !l.text.trim().is_empty());
        lines.sort_by_key(|l| l.start_time_seconds);
        Self { lines }
    }

    /// Parse either a JSON array of lines or `[MM:SS] text` formatted text.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim_start();
        if trimmed.starts_with('[') && trimmed[1..].trim_start().starts_with('{') {
            let lines: Vec<TranscriptLine> = serde_json::from_str(trimmed)?;
            return Ok(Self::new(lines));
        }

        let mut lines = Vec::new();
        for (number, raw) in input.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let caps = line_pattern().captures(raw).ok_or_else(|| {
                NotewiseError::InvalidInput(format!(
                    "Line {} has no [MM:SS] timestamp: {}",
                    number + 1,
                    raw
                ))
            })?;
            let seconds = parse_clock(&caps[1]).ok_or_else(|| {
                NotewiseError::InvalidInput(format!("Bad timestamp on line {}", number + 1))
            })?;
            lines.push(TranscriptLine::new(seconds, caps[2].trim()));
        }

        if lines.is_empty() {
            return Err(NotewiseError::InvalidInput("Transcript is empty".to_string()));
        }
        Ok(Self::new(lines))
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Start time of the last line.
    pub fn last_start_seconds(&self) -> u32 {
        self.lines.last().map(|l| l.start_time_seconds).unwrap_or(0)
    }

    /// Lines with `start <= t < end`, or `t >= start` when `end` is `None`.
    pub fn slice(&self, start: u32, end: Option<u32>) -> Vec<&TranscriptLine> {
        self.lines
            .iter()
            .filter(|l| {
                l.start_time_seconds >= start && end.map_or(true, |e| l.start_time_seconds < e)
            })
            .collect()
    }

    /// Text of a slice, one line per transcript line.
    pub fn slice_text(&self, start: u32, end: Option<u32>) -> String {
        self.slice(start, end)
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format the transcript with timestamps for prompts and display.
    pub fn format_with_timestamps(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("[{}] {}", format_timestamp(l.start_time_seconds), l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\[(\d+(?::\d{1,2}){0,2})\]\s*(.*)$").expect("valid transcript line regex")
    })
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS` into seconds.
pub fn parse_clock(value: &str) -> Option<u32> {
    let parts: Vec<&str> = value.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut total: u32 = 0;
    for part in parts {
        let n: u32 = part.trim().parse().ok()?;
        total = total.checked_mul(60)?.checked_add(n)?;
    }
    Some(total)
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        Transcript::new(vec![
            TranscriptLine::new(0, "intro"),
            TranscriptLine::new(30, "topic X starts"),
            TranscriptLine::new(600, "topic Y starts"),
        ])
    }

    #[test]
    fn test_slice_is_half_open() {
        let t = sample();
        let first = t.slice(30, Some(600));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, "topic X starts");

        let last = t.slice(600, None);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].text, "topic Y starts");

        assert!(t.slice(31, Some(600)).is_empty());
    }

    #[test]
    fn test_parse_bracketed_lines() {
        let t = Transcript::parse("[00:00] hello\n\n[01:05] second\n[1:00:00] an hour in\n").unwrap();
        let starts: Vec<u32> = t.lines().iter().map(|l| l.start_time_seconds).collect();
        assert_eq!(starts, vec![0, 65, 3600]);
        assert_eq!(t.lines()[1].text, "second");
    }

    #[test]
    fn test_parse_json_lines_sorted() {
        let t = Transcript::parse(
            r#"[{"startTimeSeconds": 40, "text": "b"}, {"start_seconds": 10, "text": "a"}, {"time": 50, "text": " "}]"#,
        )
        .unwrap();
        assert_eq!(t.lines().len(), 2);
        assert_eq!(t.lines()[0].text, "a");
    }

    #[test]
    fn test_parse_rejects_untimed_line() {
        assert!(Transcript::parse("[00:01] ok\nno timestamp here").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(125), "02:05");
        assert_eq!(format_timestamp(3725), "01:02:05");
        assert_eq!(parse_clock("02:05"), Some(125));
        assert_eq!(parse_clock("x"), None);
    }
}
