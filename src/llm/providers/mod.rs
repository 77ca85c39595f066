// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Backend-specific provider adapters

pub mod anthropic;
pub mod deepseek;
pub mod gemini;
pub mod mistral;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiAdapter;
pub use mistral::MistralAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;

use crate::error::ProviderError;

/// Map a reqwest transport failure to a provider error class
///
/// Connection and timeout failures may resolve on retry; anything else from
/// the transport layer is treated as permanent.
pub(crate) fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_connect() || e.is_timeout() {
        ProviderError::Transient(e.to_string())
    } else {
        ProviderError::Permanent(e.to_string())
    }
}

/// Map a non-success HTTP status to a provider error class
///
/// Rate limiting and server-side failures are retryable; client errors
/// (bad request, auth, not found) are not.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body);
    if status.as_u16() == 429 || status.is_server_error() {
        ProviderError::Transient(detail)
    } else {
        ProviderError::Permanent(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_rate_limit_is_transient() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            ProviderError::Transient(_)
        ));
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            ProviderError::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            ProviderError::Transient(_)
        ));
    }

    #[test]
    fn test_client_errors_are_permanent() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            assert!(matches!(
                classify_status(status, "no"),
                ProviderError::Permanent(_)
            ));
        }
    }
}
