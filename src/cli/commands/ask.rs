//! Ask command implementation.

use super::components::Components;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::models::ChatTurn;
use crate::repository::ContentRepository;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    content_id: i64,
    question: &str,
    model: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let components = Components::build(settings).await?;
    let history_turns = components.settings.rag.max_history_turns;
    let answerer = components.answerer(model);

    let history = components
        .repository
        .recent_turns(content_id, history_turns)
        .await?;

    let spinner = Output::spinner("Searching the lecture...");

    match answerer.respond(content_id, question, &history).await {
        Ok(response) => {
            spinner.finish_and_clear();
            println!("{}", response.format_for_display());

            components
                .repository
                .append_turn(content_id, &ChatTurn::new(question, &response.answer))
                .await?;
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e.user_message()));
            return Err(e.into());
        }
    }

    Ok(())
}
