//! Notewise - study material and grounded chat from lecture transcripts
//!
//! # Overview
//!
//! Notewise takes a timestamped transcript and:
//! - Splits it into topics with a language model
//! - Writes an easy and a hard summary plus quiz items for every topic, in parallel
//! - Stores the results and indexes them in a vector database
//! - Answers questions about one lecture using only that lecture's passages
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `models` - Transcripts, study blocks and retrieval results
//! - `llm` / `embedding` - Chat completion and embedding clients
//! - `pipeline` - Segmentation, summarization and run coordination
//! - `indexing` / `vector_store` - Embedding blocks and storing them per content item
//! - `rag` - Retrieval and answer generation
//! - `repository` - Persistence of summaries, quizzes and chat history
//! - `events` / `jobs` - Progress events and job handling
//!
//! # Example
//!
//! ```rust,no_run
//! use notewise::cli::commands::Components;
//! use notewise::config::Settings;
//! use notewise::models::Transcript;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let components = Components::build(settings).await?;
//!
//!     let transcript = Transcript::parse("[00:00] Welcome\n[02:10] Binary numbers")?;
//!     let result = components.coordinator().run_pipeline(7, &transcript).await?;
//!     println!("Generated {} blocks", result.blocks.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod events;
pub mod indexing;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod repository;
pub mod retry;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{NotewiseError, Result};
