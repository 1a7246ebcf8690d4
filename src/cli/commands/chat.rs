//! Interactive chat about one content item.

use super::components::Components;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::models::ChatTurn;
use crate::repository::ContentRepository;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(content_id: i64, model: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let components = Components::build(settings).await?;
    let history_turns = components.settings.rag.max_history_turns;
    let answerer = components.answerer(model);

    let mut history = components
        .repository
        .recent_turns(content_id, history_turns)
        .await?;
    debug!("Loaded {} earlier turns", history.len());

    println!("\n{}", style(format!("Notewise Chat (content {})", content_id)).bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to forget earlier turns.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            Output::info("Conversation history cleared for this session.");
            continue;
        }

        match answerer.respond(content_id, input, &history).await {
            Ok(response) => {
                println!("\n{} {}\n", style("Notewise:").cyan().bold(), response.answer);

                let turn = ChatTurn::new(input, response.answer);
                components.repository.append_turn(content_id, &turn).await?;
                history.push(turn);
                if history.len() > history_turns {
                    history.remove(0);
                }
            }
            Err(e) => {
                Output::error(&e.user_message());
            }
        }
    }

    Ok(())
}
