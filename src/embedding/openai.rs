//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, RetrySettings};
use crate::error::{NotewiseError, Result};
use crate::openai::{classify_error, create_client};
use crate::retry::RetryPolicy;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput, EncodingFormat};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI has a limit on inputs per request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("text-embedding-3-small", 1536)
    }

    /// Create a new OpenAI embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            dimensions,
            retry: RetryPolicy::default(),
        })
    }

    /// Create an embedder from settings.
    pub fn from_settings(settings: &EmbeddingSettings, retry: &RetrySettings) -> Result<Self> {
        let mut embedder = Self::with_config(&settings.model, settings.dimensions as usize)?;
        embedder.retry = RetryPolicy::from_settings(retry);
        Ok(embedder)
    }

    /// Generate embeddings for multiple texts, in requests of at most 100 inputs.
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .encoding_format(EncodingFormat::Float)
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| NotewiseError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .retry
                .run("embedding", || {
                    let request = request.clone();
                    async move {
                        self.client
                            .embeddings()
                            .create(request)
                            .await
                            .map_err(classify_error)
                    }
                })
                .await?;

            if response.data.len() != chunk.len() {
                return Err(NotewiseError::Embedding(format!(
                    "Got {} embeddings for {} inputs",
                    response.data.len(),
                    chunk.len()
                )));
            }

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            for embedding_data in embeddings {
                all_embeddings.push(embedding_data.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| NotewiseError::Embedding("Empty embedding response".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
