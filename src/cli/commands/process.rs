//! Process and job commands: run the pipeline for one content item.

use super::components::Components;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ProcessingMode, Settings};
use crate::events::{EventKind, ProgressEvent, ProgressSink};
use crate::jobs::{JobRequest, JobRunner};
use crate::models::Transcript;
use crate::pipeline::{Cancellation, PipelineResult};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shows job events on a spinner and in the log.
struct SpinnerSink {
    spinner: ProgressBar,
}

impl ProgressSink for SpinnerSink {
    fn emit(&self, event: ProgressEvent) {
        match event.kind {
            EventKind::Error => warn!(task_id = %event.task_id, "{}", event.message),
            kind => info!(task_id = %event.task_id, event = kind.as_str(), "{}", event.message),
        }
        if !event.kind.is_terminal() {
            self.spinner.set_message(event.message);
        }
    }
}

/// Run the process command.
pub async fn run_process(
    content_id: i64,
    transcript_path: &str,
    task_id: Option<String>,
    settings: Settings,
) -> Result<()> {
    let path = Settings::expand_path(transcript_path);
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read transcript {:?}", path))?;
    let transcript = Transcript::parse(&input)?;

    let request = JobRequest {
        task_id: task_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        content_id,
        transcript,
    };
    execute(request, settings).await
}

/// Run the job command from a trigger event file.
pub async fn run_job(file: &str, settings: Settings) -> Result<()> {
    let path = Settings::expand_path(file);
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read job file {:?}", path))?;
    let request = JobRequest::from_json(&input)?;
    execute(request, settings).await
}

async fn execute(request: JobRequest, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Process, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mode = settings.pipeline.processing_mode;
    let components = Components::build(settings).await?;
    let coordinator = Arc::new(components.coordinator());

    let spinner = Output::spinner(&format!(
        "Processing content {} ({} lines)...",
        request.content_id,
        request.transcript.lines().len()
    ));
    let sink = Arc::new(SpinnerSink {
        spinner: spinner.clone(),
    });
    let runner = JobRunner::new(coordinator, sink);

    let cancel = Cancellation::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = runner.handle_with_cancel(request, &cancel).await;
    ctrl_c.abort();
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            report(&result, mode);
            Ok(())
        }
        Err(e) => {
            Output::error(&e.user_message());
            Err(e.into())
        }
    }
}

fn report(result: &PipelineResult, mode: ProcessingMode) {
    if result.cancelled {
        Output::warning(&format!(
            "Run stopped early; kept {} of {} sections",
            result.blocks.len(),
            result.boundaries.len()
        ));
    } else {
        Output::success(&format!(
            "Generated {} study blocks for content {}",
            result.blocks.len(),
            result.content_id
        ));
    }

    for block in &result.blocks {
        Output::block_summary(block);
    }

    Output::header("Summary");
    Output::kv("Topics", &result.boundaries.len().to_string());
    Output::kv("Blocks", &result.blocks.len().to_string());
    if result.dropped_chunks > 0 {
        Output::kv("Failed sections", &result.dropped_chunks.to_string());
    }
    if result.skipped_slices > 0 {
        Output::kv("Empty sections", &result.skipped_slices.to_string());
    }
    match mode {
        ProcessingMode::Internal => {
            Output::kv("Indexed", &result.indexed.to_string());
            if result.index_failures > 0 {
                Output::warning(&format!(
                    "{} blocks could not be indexed; chat will not see them",
                    result.index_failures
                ));
            }
        }
        ProcessingMode::External => Output::kv("Indexing", "handed off"),
    }
}
