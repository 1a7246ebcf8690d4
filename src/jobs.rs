//! Job handling: runs the pipeline for a trigger event and reports progress.

use crate::error::{NotewiseError, Result};
use crate::events::{ProgressSink, TaskProgress};
use crate::models::Transcript;
use crate::pipeline::{Cancellation, PipelineCoordinator, PipelineResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A request to process one content item's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub task_id: String,
    pub content_id: i64,
    pub transcript: Transcript,
}

impl JobRequest {
    /// Parse a trigger event from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: JobRequest = serde_json::from_str(json)?;
        if request.task_id.trim().is_empty() {
            return Err(NotewiseError::InvalidInput("Job has no taskId".to_string()));
        }
        Ok(request)
    }
}

/// Runs jobs against a pipeline and publishes their progress.
pub struct JobRunner {
    coordinator: Arc<PipelineCoordinator>,
    sink: Arc<dyn ProgressSink>,
}

impl JobRunner {
    pub fn new(coordinator: Arc<PipelineCoordinator>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { coordinator, sink }
    }

    /// Run a job to completion.
    pub async fn handle(&self, request: JobRequest) -> Result<PipelineResult> {
        self.handle_with_cancel(request, &Cancellation::new()).await
    }

    /// Run a job, emitting `start`, stage `progress` events, then `done` or `error`.
    ///
    /// A cancelled run still returns its partial result but reports `error`.
    #[instrument(skip(self, request, cancel), fields(task_id = %request.task_id, content_id = request.content_id))]
    pub async fn handle_with_cancel(
        &self,
        request: JobRequest,
        cancel: &Cancellation,
    ) -> Result<PipelineResult> {
        let progress = TaskProgress::new(request.task_id.clone(), self.sink.clone());
        progress.start(format!("Processing content {}", request.content_id));

        let outcome = self
            .coordinator
            .run(request.content_id, &request.transcript, cancel, Some(&progress))
            .await;

        match outcome {
            Ok(result) if result.cancelled => {
                progress.error(NotewiseError::Cancelled.user_message());
                Ok(result)
            }
            Ok(result) => {
                let mut message = format!("Generated {} study blocks", result.blocks.len());
                if result.dropped_chunks > 0 {
                    message.push_str(&format!(" ({} sections could not be summarized)", result.dropped_chunks));
                }
                if result.blocks.is_empty() {
                    if let Some(reason) = &result.first_failure {
                        warn!("Job {} produced no blocks: {}", request.task_id, reason);
                    }
                }
                info!("Job {} finished: {}", request.task_id, message);
                progress.done(message);
                Ok(result)
            }
            Err(e) => {
                progress.error(e.user_message());
                Err(e)
            }
        }
    }
}
