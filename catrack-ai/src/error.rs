//! Error types for catrack-ai
//!
//! Every failure of the extraction pipeline is classified so the calling
//! screen can choose between "retry", "proceed without AI", or "block
//! submission". Recovery never happens below that boundary.

use serde::Serialize;
use thiserror::Error;

/// Extraction pipeline errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Caller-side input problem; no network attempt was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The deadline fired before the service responded; the in-flight call
    /// was cancelled and local evidence is preserved
    #[error("Request timed out")]
    Timeout,

    /// Recoverable upstream status (502/504), surfaced after the bounded
    /// retry was exhausted
    #[error("Transient upstream error {status}: {body}")]
    Transient { status: u16, body: String },

    /// No response reached the server at all; retry later, evidence
    /// preserved locally
    #[error("Network error: {0}")]
    Transport(String),

    /// 2xx response whose body violates the inspection contract; a server
    /// defect, never silently defaulted
    #[error("Malformed response: {0}")]
    ContractViolation(String),

    /// Any other non-2xx status; not retryable
    #[error("API error {status}: {body}")]
    Terminal { status: u16, body: String },

    /// A newer submission for the same item replaced this one
    #[error("Submission superseded by a newer request for the same item")]
    Superseded,
}

impl ExtractError {
    /// True when the caller may retry later with the same local evidence.
    pub fn is_retry_later(&self) -> bool {
        matches!(
            self,
            ExtractError::Timeout | ExtractError::Transient { .. } | ExtractError::Transport(_)
        )
    }

    /// Numeric status/message pair for callers that branch on codes.
    pub fn to_typed(&self) -> TypedError {
        match self {
            ExtractError::InvalidInput(msg) => TypedError::new(400, msg.clone()),
            ExtractError::Timeout => TypedError::new(504, "Request timed out"),
            ExtractError::Transient { status, body } => TypedError::new(*status, body.clone()),
            ExtractError::Transport(msg) => TypedError::new(503, msg.clone()),
            ExtractError::ContractViolation(_) => TypedError::new(500, "Malformed response"),
            ExtractError::Terminal { status, body } => TypedError::new(*status, body.clone()),
            ExtractError::Superseded => TypedError::new(409, "Submission superseded"),
        }
    }
}

/// Status code plus message, enough for the caller to branch on
/// retryable vs terminal conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedError {
    pub status_code: u16,
    pub message: String,
}

impl TypedError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}
