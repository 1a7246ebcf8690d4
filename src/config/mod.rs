//! Configuration module for Notewise.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, SegmentationPrompts, SummaryPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, LlmSettings, PipelineSettings, ProcessingMode,
    PromptSettings, RagSettings, RetrySettings, Settings, VectorStoreProvider,
    VectorStoreSettings,
};
