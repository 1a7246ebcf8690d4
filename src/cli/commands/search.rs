//! Search command implementation.

use super::components::Components;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::models::format_timestamp;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    content_id: i64,
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let components = Components::build(settings).await?;
    let retriever = components.retriever();

    let spinner = Output::spinner("Searching...");
    let results = retriever
        .retrieve_scored(content_id, query, limit, min_score)
        .await;
    spinner.finish_and_clear();

    match results {
        Ok(result) => {
            if result.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", result.passages.len()));

                for passage in &result.passages {
                    Output::search_result(
                        &passage.title,
                        &format_timestamp(passage.start_seconds),
                        passage.score,
                        &passage.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
