//! Scripted collaborators shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{NotewiseError, Result};
use crate::llm::{CompletionRequest, LanguageModel};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;
type Delayer = Box<dyn Fn(&CompletionRequest) -> Option<Duration> + Send + Sync>;

/// Language model that answers from a closure and records every request.
pub struct ScriptedModel {
    respond: Responder,
    delay: Option<Delayer>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(respond: impl Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Sleep before answering, for as long as `delay` says.
    pub fn with_delay(
        mut self,
        delay: impl Fn(&CompletionRequest) -> Option<Duration> + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let result = (self.respond)(request);
        if let Some(duration) = self.delay.as_ref().and_then(|delay| delay(request)) {
            tokio::time::sleep(duration).await;
        }
        result
    }
}

/// Embedder that counts occurrences of a fixed vocabulary.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    fail_on: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            fail_on: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail for any text containing `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Sleep before every embedding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| lower.matches(word.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(NotewiseError::Embedding(format!("refused to embed {:?}", needle)));
            }
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }
}
