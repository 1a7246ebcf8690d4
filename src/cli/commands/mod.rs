//! CLI command implementations.

mod ask;
mod chat;
mod components;
mod config;
mod process;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use components::Components;
pub use config::run_config;
pub use process::{run_job, run_process};
pub use search::run_search;
