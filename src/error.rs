//! Error types for Notewise.

use thiserror::Error;

/// Library-level error type for Notewise operations.
#[derive(Error, Debug)]
pub enum NotewiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not parse topic segmentation: {0}")]
    SegmentationParse(String),

    #[error("Chunk summarization failed at {start_seconds}s: {reason}")]
    ChunkSummarization { start_seconds: u32, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Language model error: {0}")]
    LanguageModel(String),

    #[error("Not authorized by the external service: {0}")]
    Unauthorized(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Rejected by content moderation: {0}")]
    ContentModeration(String),

    #[error("Input too large for the model context: {0}")]
    ContextTooLarge(String),

    #[error("External service unavailable: {0}")]
    ServerUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("A pipeline run is already in progress for content {0}")]
    AlreadyRunning(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl NotewiseError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NotewiseError::RateLimited(_)
            | NotewiseError::ServerUnavailable(_)
            | NotewiseError::Timeout(_) => true,
            NotewiseError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            _ => false,
        }
    }

    /// Classify a non-success HTTP status from an external service.
    ///
    /// Statuses without a dedicated kind become `fallback(detail)`, so each
    /// caller reports them as its own service's error.
    pub fn from_status(
        status: reqwest::StatusCode,
        body: &str,
        fallback: fn(String) -> NotewiseError,
    ) -> Self {
        let detail = format!("{} {}", status, truncate(body, 300));
        match status.as_u16() {
            401 | 403 => NotewiseError::Unauthorized(detail),
            402 => NotewiseError::QuotaExceeded(detail),
            413 => NotewiseError::ContextTooLarge(detail),
            429 => {
                if body.contains("insufficient_quota") {
                    NotewiseError::QuotaExceeded(detail)
                } else {
                    NotewiseError::RateLimited(detail)
                }
            }
            408 => NotewiseError::Timeout(detail),
            500..=599 => NotewiseError::ServerUnavailable(detail),
            _ => fallback(detail),
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            NotewiseError::Unauthorized(_) => {
                "The AI service rejected our credentials. Check the configured API key.".to_string()
            }
            NotewiseError::QuotaExceeded(_) => {
                "The AI service quota has been used up. Try again later.".to_string()
            }
            NotewiseError::RateLimited(_) => {
                "The AI service is receiving too many requests. Try again shortly.".to_string()
            }
            NotewiseError::ContentModeration(_) => {
                "The content was rejected by the AI service's moderation policy.".to_string()
            }
            NotewiseError::ContextTooLarge(_) => {
                "The transcript is too long for the model to process in one request.".to_string()
            }
            NotewiseError::ServerUnavailable(_) | NotewiseError::Timeout(_) => {
                "The AI service is temporarily unavailable. Try again later.".to_string()
            }
            NotewiseError::SegmentationParse(_) => {
                "The transcript could not be divided into topics. The job can be retried.".to_string()
            }
            NotewiseError::AlreadyRunning(id) => {
                format!("Content {} is already being processed.", id)
            }
            NotewiseError::Cancelled => "The job was cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Result type alias for Notewise operations.
pub type Result<T> = std::result::Result<T, NotewiseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            NotewiseError::from_status(StatusCode::UNAUTHORIZED, "", NotewiseError::LanguageModel),
            NotewiseError::Unauthorized(_)
        ));
        assert!(matches!(
            NotewiseError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down", NotewiseError::LanguageModel),
            NotewiseError::RateLimited(_)
        ));
        assert!(matches!(
            NotewiseError::from_status(StatusCode::TOO_MANY_REQUESTS, r#"{"code":"insufficient_quota"}"#, NotewiseError::LanguageModel),
            NotewiseError::QuotaExceeded(_)
        ));
        assert!(matches!(
            NotewiseError::from_status(StatusCode::SERVICE_UNAVAILABLE, "", NotewiseError::LanguageModel),
            NotewiseError::ServerUnavailable(_)
        ));
    }

    #[test]
    fn test_unclassified_status_uses_caller_kind() {
        assert!(matches!(
            NotewiseError::from_status(StatusCode::BAD_REQUEST, "bad model", NotewiseError::LanguageModel),
            NotewiseError::LanguageModel(_)
        ));
        assert!(matches!(
            NotewiseError::from_status(StatusCode::NOT_FOUND, "no collection", NotewiseError::VectorStore),
            NotewiseError::VectorStore(_)
        ));
        assert!(matches!(
            NotewiseError::from_status(StatusCode::FORBIDDEN, "", NotewiseError::VectorStore),
            NotewiseError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_transient_kinds() {
        assert!(NotewiseError::RateLimited("x".into()).is_transient());
        assert!(NotewiseError::Timeout("x".into()).is_transient());
        assert!(!NotewiseError::QuotaExceeded("x".into()).is_transient());
        assert!(!NotewiseError::SegmentationParse("x".into()).is_transient());
    }
}
