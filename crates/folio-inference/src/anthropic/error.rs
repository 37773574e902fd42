//! Anthropic-specific error handling.

use folio_core::Error;

/// Anthropic API error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnthropicErrorCode {
    /// Invalid API key.
    AuthenticationError,
    /// Key lacks access to the resource.
    PermissionError,
    /// Model or endpoint not found.
    NotFound,
    /// Malformed or oversized request.
    InvalidRequest,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// API temporarily overloaded (HTTP 529).
    Overloaded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl AnthropicErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (_, "authentication_error") => Self::AuthenticationError,
            (403, _) | (_, "permission_error") => Self::PermissionError,
            (404, _) | (_, "not_found_error") => Self::NotFound,
            (429, _) | (_, "rate_limit_error") => Self::RateLimitExceeded,
            (529, _) | (_, "overloaded_error") => Self::Overloaded,
            (400, _) | (413, _) | (_, "invalid_request_error") => Self::InvalidRequest,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::Overloaded | Self::ServerError
        )
    }
}

/// Convert an Anthropic error to a folio Error.
pub fn to_folio_error(code: AnthropicErrorCode, message: &str) -> Error {
    match code {
        AnthropicErrorCode::AuthenticationError | AnthropicErrorCode::PermissionError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        AnthropicErrorCode::NotFound => Error::Config(format!("Model not found: {}", message)),
        AnthropicErrorCode::InvalidRequest => {
            Error::Inference(format!("Invalid request: {}", message))
        }
        AnthropicErrorCode::RateLimitExceeded => {
            Error::Inference(format!("Rate limit exceeded: {}", message))
        }
        AnthropicErrorCode::Overloaded => Error::Inference(format!("Overloaded: {}", message)),
        AnthropicErrorCode::ServerError => Error::Inference(format!("Server error: {}", message)),
        AnthropicErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}
