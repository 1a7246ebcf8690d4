//! CLI module for Notewise.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Notewise - study material and grounded chat from transcripts
///
/// Turns a lecture transcript into topic segments, two levels of summaries and
/// quiz items, then answers questions using only that lecture.
#[derive(Parser, Debug)]
#[command(name = "notewise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate summaries and quizzes for a transcript and index it
    Process {
        /// Content id the material belongs to
        #[arg(long)]
        content_id: i64,

        /// Transcript file (JSON array of lines, or "[MM:SS] text" lines)
        #[arg(short, long)]
        transcript: String,

        /// Task id used in progress events
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Run a job from a trigger event file ({taskId, contentId, transcript})
    Job {
        /// Path to the job JSON file
        file: String,
    },

    /// Ask a single question about a content item
    Ask {
        /// Content id to ask about
        #[arg(long)]
        content_id: i64,

        /// The question to ask
        question: String,

        /// LLM model to use for the answer
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive chat about a content item
    Chat {
        /// Content id to chat about
        #[arg(long)]
        content_id: i64,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search a content item's transcript passages
    Search {
        /// Content id to search
        #[arg(long)]
        content_id: i64,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::try_parse_from([
            "notewise",
            "-vv",
            "process",
            "--content-id",
            "12",
            "--transcript",
            "lecture.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process {
                content_id,
                transcript,
                task_id,
            } => {
                assert_eq!(content_id, 12);
                assert_eq!(transcript, "lecture.json");
                assert!(task_id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::try_parse_from(["notewise", "search", "--content-id", "3", "binary"]).unwrap();
        match cli.command {
            Commands::Search { limit, min_score, .. } => {
                assert_eq!(limit, 5);
                assert!((min_score - 0.3).abs() < f32::EPSILON);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_content_id_is_required() {
        assert!(Cli::try_parse_from(["notewise", "ask", "what is binary?"]).is_err());
    }
}
