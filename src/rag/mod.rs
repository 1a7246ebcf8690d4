//! RAG (Retrieval-Augmented Generation) for questions about one content item.
//!
//! [`RagRetriever`] finds the relevant transcript passages and
//! [`ChatAnswerer`] answers from them alone.

mod answerer;
mod retriever;

pub use answerer::{ChatAnswerer, ChatResponse, NO_CONTEXT_ANSWER};
pub use retriever::RagRetriever;
