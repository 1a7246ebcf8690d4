//! Wiring of the pipeline and chat components from settings.

use crate::config::{Prompts, Settings, VectorStoreProvider};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::indexing::ContentIndexer;
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::pipeline::{ChunkSummarizer, PipelineCoordinator, TopicSegmenter};
use crate::rag::{ChatAnswerer, RagRetriever};
use crate::repository::SqliteRepository;
use crate::vector_store::{MemoryVectorStore, QdrantVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared services built once per command.
pub struct Components {
    pub settings: Settings,
    pub prompts: Prompts,
    pub repository: Arc<SqliteRepository>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
}

impl Components {
    pub async fn build(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let repository = Arc::new(SqliteRepository::new(&settings.database_path())?);

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding, &settings.retry)?);

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
            VectorStoreProvider::Qdrant => {
                let qdrant = QdrantVectorStore::new(&settings.vector_store, &settings.retry)?;
                qdrant.ensure_collection(embedder.dimensions()).await?;
                info!("Using Qdrant collection {}", settings.vector_store.collection);
                Arc::new(qdrant)
            }
            VectorStoreProvider::Memory => {
                warn!("Using the in-memory vector store; the index is lost when the process exits");
                Arc::new(MemoryVectorStore::new())
            }
        };

        let model: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::new(
            &settings.llm.model,
            &settings.llm,
            &settings.retry,
        )?);

        Ok(Self {
            settings,
            prompts,
            repository,
            store,
            embedder,
            model,
        })
    }

    pub fn coordinator(&self) -> PipelineCoordinator {
        let pipeline = &self.settings.pipeline;
        let segmenter = TopicSegmenter::new(self.model.clone(), self.prompts.clone())
            .with_topic_range(pipeline.min_topics, pipeline.max_topics)
            .with_model_name(Some(self.settings.llm.segmentation_model.clone()))
            .with_temperature(self.settings.llm.temperature);
        let summarizer = ChunkSummarizer::new(self.model.clone(), self.prompts.clone())
            .with_temperature(self.settings.llm.temperature);
        let indexer = Arc::new(ContentIndexer::new(self.embedder.clone(), self.store.clone()));

        PipelineCoordinator::new(
            segmenter,
            summarizer,
            indexer,
            self.repository.clone(),
            pipeline.clone(),
        )
    }

    pub fn retriever(&self) -> RagRetriever {
        RagRetriever::new(self.embedder.clone(), self.store.clone())
    }

    /// Chat answerer, optionally overriding the configured answer model.
    pub fn answerer(&self, model: Option<String>) -> ChatAnswerer {
        let mut rag = self.settings.rag.clone();
        if let Some(model) = model {
            rag.model = model;
        }
        ChatAnswerer::new(self.retriever(), self.model.clone(), self.prompts.clone(), rag)
    }
}
