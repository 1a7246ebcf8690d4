//! Prompt templates for Notewise.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub segmentation: SegmentationPrompts,
    pub summary: SummaryPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for topic segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SegmentationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an analyst who divides lecture and talk transcripts into topics.

Rules:
- Identify where each major topic begins, using the timestamps in the transcript
- Spread topics across the entire duration; do not cluster them near the start
- Skip greetings, sponsor reads and sign-offs when choosing start times
- Respond with a JSON array only, no commentary"#
                .to_string(),

            user: r#"Divide this transcript into between {{min_topics}} and {{max_topics}} topics.
The transcript lasts {{duration}}.

Transcript:
{{transcript}}

For each topic provide:
- "title": a short descriptive title (3-8 words)
- "time": the start time in whole seconds
- "keywords": up to 3 keywords for the topic

Example:
[
  {"title": "Why binary matters", "time": 45, "keywords": ["binary", "bits"]},
  {"title": "Bitwise operations", "time": 312, "keywords": ["AND", "XOR", "shift"]}
]"#
            .to_string(),
        }
    }
}

/// Prompts for per-chunk summarization and quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You write study material from transcript excerpts.

Use only the excerpt you are given. Never add facts from outside it.
Respond with a single JSON object and nothing else."#
                .to_string(),

            user: r#"Topic: {{title}} (starts at {{timestamp}})

Excerpt:
{{chunk}}

Return a JSON object with these keys:
- "title": a title for this part
- "summaryEasy": a self-contained summary for beginners, 3-5 sentences
- "summaryHard": a dense summary for advanced learners, 2-3 sentences
- "trueFalse": {"statement": "...", "answer": true or false, "explanation": "..."}
- "open": {"question": "...", "answer": "a model answer"}"#
                .to_string(),
        }
    }
}

/// Prompts for grounded chat answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You answer questions about a single lecture using only the context provided.

Guidelines:
- Answer only from the context
- If the context does not contain the answer, say explicitly that the lecture does not cover it
- Keep answers concise and in the language of the question"#
                .to_string(),

            user: r#"Context:
{{context}}

Question: {{question}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let segmentation_path = custom_path.join("segmentation.toml");
            if segmentation_path.exists() {
                let content = std::fs::read_to_string(&segmentation_path)?;
                prompts.segmentation = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.segmentation.user.contains("{{transcript}}"));
        assert!(prompts.summary.user.contains("{{chunk}}"));
        assert!(prompts.chat.user.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_call_variables_override_config_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("audience".to_string(), "students".to_string());
        prompts.variables.insert("title".to_string(), "from config".to_string());

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "from call".to_string());

        let rendered = prompts.render_with_custom("{{title}} for {{audience}}", &vars);
        assert_eq!(rendered, "from call for students");
    }

    #[test]
    fn test_load_custom_summary_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "system = \"custom system\"\nuser = \"{{chunk}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.system, "custom system");
        assert!(prompts.chat.system.contains("only the context"));
    }
}
