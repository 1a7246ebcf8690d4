//! Grounded answer generation.

use super::RagRetriever;
use crate::config::{Prompts, RagSettings};
use crate::error::Result;
use crate::llm::{CompletionRequest, LanguageModel, Message};
use crate::models::{format_timestamp, ChatTurn, RetrievedPassage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Returned verbatim when retrieval finds nothing for the question.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find anything in this lecture that answers your question.";

/// Answers questions about one content item from its retrieved passages.
pub struct ChatAnswerer {
    retriever: RagRetriever,
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: RagSettings,
}

impl ChatAnswerer {
    pub fn new(
        retriever: RagRetriever,
        model: Arc<dyn LanguageModel>,
        prompts: Prompts,
        settings: RagSettings,
    ) -> Self {
        Self {
            retriever,
            model,
            prompts,
            settings,
        }
    }

    /// Answer a question, using up to `max_history_turns` of `history`.
    pub async fn answer(&self, content_id: i64, question: &str, history: &[ChatTurn]) -> Result<String> {
        Ok(self.respond(content_id, question, history).await?.answer)
    }

    /// Answer a question and return the passages it was grounded on.
    #[instrument(skip(self, question, history), fields(history = history.len()))]
    pub async fn respond(
        &self,
        content_id: i64,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<ChatResponse> {
        let retrieval = self
            .retriever
            .retrieve_scored(content_id, question, self.settings.top_k, self.settings.min_score)
            .await?;

        if retrieval.is_empty() {
            info!("No context for question on content {}", content_id);
            return Ok(ChatResponse {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), retrieval.texts().join("\n"));
        vars.insert("question".to_string(), question.to_string());

        let system = self.prompts.render_with_custom(&self.prompts.chat.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.chat.user, &vars);

        let skip = history.len().saturating_sub(self.settings.max_history_turns);
        let prior: Vec<Message> = history[skip..]
            .iter()
            .flat_map(|turn| [Message::user(&turn.question), Message::assistant(&turn.answer)])
            .collect();

        let request = CompletionRequest::new(user)
            .with_system(system)
            .with_history(prior)
            .with_model(&self.settings.model);

        let answer = self.model.complete(&request).await?;
        debug!("Answered from {} passages", retrieval.passages.len());

        Ok(ChatResponse {
            answer,
            sources: retrieval.passages,
        })
    }
}

/// An answer with the passages it was grounded on.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<RetrievedPassage>,
}

impl ChatResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} @ {} (score: {:.2})",
                    if source.title.is_empty() { "Untitled" } else { source.title.as_str() },
                    format_timestamp(source.start_seconds),
                    source.score
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::test_support::{KeywordEmbedder, ScriptedModel};
    use crate::vector_store::{point_id, MemoryVectorStore, VectorPayload, VectorRecord, VectorStore};

    async fn answerer(model: Arc<ScriptedModel>, settings: RagSettings) -> ChatAnswerer {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(&[
                VectorRecord {
                    id: point_id(1, 0).unwrap(),
                    vector: vec![1.0, 0.0],
                    payload: VectorPayload {
                        content_id: 1,
                        text: "Binary uses two digits.".to_string(),
                        title: "Binary".to_string(),
                        start_seconds: 0,
                    },
                },
                VectorRecord {
                    id: point_id(1, 90).unwrap(),
                    vector: vec![0.8, 0.6],
                    payload: VectorPayload {
                        content_id: 1,
                        text: "Each digit is a bit.".to_string(),
                        title: "Bits".to_string(),
                        start_seconds: 90,
                    },
                },
            ])
            .await
            .unwrap();

        let retriever = RagRetriever::new(Arc::new(KeywordEmbedder::new(&["binary", "gate"])), store);
        ChatAnswerer::new(retriever, model, Prompts::default(), settings)
    }

    #[tokio::test]
    async fn test_no_context_returns_fallback_without_model_call() {
        let model = Arc::new(ScriptedModel::fixed("should not be used"));
        let answerer = answerer(model.clone(), RagSettings::default()).await;

        let answer = answerer.answer(2, "What is binary?", &[]).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(model.calls(), 0);

        // Nothing above the score threshold counts as no context too
        let answer = answerer.answer(1, "Tell me about history", &[]).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_layout() {
        let model = Arc::new(ScriptedModel::fixed("Binary has two digits."));
        let settings = RagSettings {
            max_history_turns: 2,
            ..Default::default()
        };
        let answerer = answerer(model.clone(), settings).await;

        let history: Vec<ChatTurn> = (0..3)
            .map(|i| ChatTurn::new(format!("q{}", i), format!("a{}", i)))
            .collect();
        let response = answerer.respond(1, "What is binary?", &history).await.unwrap();

        assert_eq!(response.answer, "Binary has two digits.");
        assert_eq!(response.sources.len(), 2);

        let requests = model.requests();
        let request = &requests[0];
        assert!(request.system.as_deref().unwrap().contains("only from the context"));
        assert!(request
            .prompt
            .contains("Binary uses two digits.\nEach digit is a bit."));
        assert!(request.prompt.ends_with("Question: What is binary?"));
        assert_eq!(request.model.as_deref(), Some("gpt-4o-mini"));

        let roles: Vec<Role> = request.history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(request.history[0].content, "q1");
        assert_eq!(request.history[3].content, "a2");
    }

    #[test]
    fn test_format_for_display() {
        let response = ChatResponse {
            answer: "Answer".to_string(),
            sources: vec![RetrievedPassage {
                text: "t".to_string(),
                score: 0.87,
                title: "Bits".to_string(),
                start_seconds: 90,
            }],
        };
        let display = response.format_for_display();
        assert!(display.starts_with("Answer"));
        assert!(display.contains("Bits @ 01:30 (score: 0.87)"));
    }
}
