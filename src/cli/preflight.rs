//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::{Settings, VectorStoreProvider};
use crate::error::{NotewiseError, Result};
use crate::openai::is_api_key_configured;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Processing calls the chat and embedding APIs and writes the index.
    Process,
    /// Asking needs the chat and embedding APIs.
    Ask,
    /// Search only embeds the query.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key()?;
    check_prompts_dir(settings)?;

    if operation == Operation::Process {
        check_pipeline(settings)?;
    }
    if settings.vector_store.provider == VectorStoreProvider::Qdrant
        && settings.vector_store.url.trim().is_empty()
    {
        return Err(NotewiseError::Config(
            "vector_store.url is empty. Set it or use provider = \"memory\"".to_string(),
        ));
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(NotewiseError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

fn check_prompts_dir(settings: &Settings) -> Result<()> {
    if let Some(dir) = &settings.prompts.custom_dir {
        let path = Settings::expand_path(dir);
        if !path.is_dir() {
            return Err(NotewiseError::Config(format!(
                "prompts.custom_dir {:?} is not a directory",
                path
            )));
        }
    }
    Ok(())
}

fn check_pipeline(settings: &Settings) -> Result<()> {
    let pipeline = &settings.pipeline;
    if pipeline.min_topics == 0 || pipeline.min_topics > pipeline.max_topics {
        return Err(NotewiseError::Config(format!(
            "pipeline.min_topics ({}) must be between 1 and max_topics ({})",
            pipeline.min_topics, pipeline.max_topics
        )));
    }
    if pipeline.max_concurrent_chunks == 0 {
        return Err(NotewiseError::Config(
            "pipeline.max_concurrent_chunks must be at least 1".to_string(),
        ));
    }
    Ok(())
}
