//! OpenAI client configuration and error classification.

use crate::error::{NotewiseError, Result};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with configured timeout.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.trim().is_empty())
}

/// Map an OpenAI client error onto the error kinds callers can act on.
pub fn classify_error(err: OpenAIError) -> NotewiseError {
    match err {
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) => {
                NotewiseError::from_status(status, &e.to_string(), NotewiseError::LanguageModel)
            }
            None if e.is_timeout() => NotewiseError::Timeout(e.to_string()),
            None if e.is_connect() => NotewiseError::ServerUnavailable(e.to_string()),
            None => NotewiseError::Http(e),
        },
        OpenAIError::ApiError(api) => {
            let detail = format!("{:?}", api).to_lowercase();
            let message = api.message.clone();
            classify_api_detail(&detail, message)
        }
        other => NotewiseError::LanguageModel(other.to_string()),
    }
}

fn classify_api_detail(detail: &str, message: String) -> NotewiseError {
    if detail.contains("invalid_api_key")
        || detail.contains("incorrect api key")
        || detail.contains("unauthorized")
        || detail.contains("permission")
    {
        NotewiseError::Unauthorized(message)
    } else if detail.contains("insufficient_quota") || detail.contains("billing") {
        NotewiseError::QuotaExceeded(message)
    } else if detail.contains("rate_limit") || detail.contains("rate limit") {
        NotewiseError::RateLimited(message)
    } else if detail.contains("content_policy")
        || detail.contains("content_filter")
        || detail.contains("moderation")
        || detail.contains("flagged")
    {
        NotewiseError::ContentModeration(message)
    } else if detail.contains("context_length_exceeded")
        || detail.contains("maximum context length")
        || detail.contains("too many tokens")
    {
        NotewiseError::ContextTooLarge(message)
    } else if detail.contains("server_error")
        || detail.contains("overloaded")
        || detail.contains("service unavailable")
    {
        NotewiseError::ServerUnavailable(message)
    } else {
        NotewiseError::LanguageModel(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_api_detail() {
        let kind = |d: &str| classify_api_detail(d, d.to_string());

        assert!(matches!(kind("code: some(\"invalid_api_key\")"), NotewiseError::Unauthorized(_)));
        assert!(matches!(kind("insufficient_quota"), NotewiseError::QuotaExceeded(_)));
        assert!(matches!(kind("rate_limit_exceeded"), NotewiseError::RateLimited(_)));
        assert!(matches!(kind("content_policy_violation"), NotewiseError::ContentModeration(_)));
        assert!(matches!(kind("context_length_exceeded"), NotewiseError::ContextTooLarge(_)));
        assert!(matches!(kind("the server is overloaded"), NotewiseError::ServerUnavailable(_)));
        assert!(matches!(kind("something else"), NotewiseError::LanguageModel(_)));
    }

    #[test]
    fn test_invalid_argument_is_model_error() {
        let err = classify_error(OpenAIError::InvalidArgument("bad".to_string()));
        assert!(matches!(err, NotewiseError::LanguageModel(_)));
    }
}
