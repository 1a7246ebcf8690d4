//! OpenAI chat completions implementation.

use super::{CompletionRequest, LanguageModel, Role};
use crate::config::{LlmSettings, RetrySettings};
use crate::error::{NotewiseError, Result};
use crate::openai::{classify_error, create_client_with_timeout};
use crate::retry::RetryPolicy;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat completion model backed by the OpenAI API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    retry: RetryPolicy,
}

impl OpenAIChatModel {
    /// Create a model client with the given default model name.
    pub fn new(model: &str, settings: &LlmSettings, retry: &RetrySettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            model: model.to_string(),
            retry: RetryPolicy::from_settings(retry),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let map = |e: async_openai::error::OpenAIError| NotewiseError::LanguageModel(e.to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(map)?
                    .into(),
            );
        }

        for message in &request.history {
            let converted: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(map)?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(map)?
                    .into(),
            };
            messages.push(converted);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(map)?
                .into(),
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.model.as_deref().unwrap_or(&self.model))
            .messages(messages);
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }
        if request.json_object {
            args.response_format(ResponseFormat::JsonObject);
        }
        args.build().map_err(map)
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.model)))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let built = self.build_request(request)?;

        let response = self
            .retry
            .run("chat completion", || {
                let built = built.clone();
                async move { self.client.chat().create(built).await.map_err(classify_error) }
            })
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NotewiseError::LanguageModel("Empty response from LLM".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| {
                if choice.message.refusal.is_some() {
                    NotewiseError::ContentModeration("The model refused the request".to_string())
                } else {
                    NotewiseError::LanguageModel("Empty response from LLM".to_string())
                }
            })?;

        debug!("LLM response: {}", content.chars().take(200).collect::<String>());
        Ok(content)
    }
}
