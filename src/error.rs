//! Error taxonomy for route planning.

use thiserror::Error;

/// Failure kinds surfaced by the planning core.
///
/// `InvalidInput` and `NoFeasibleRoute` are client-facing; `UpstreamUnavailable`
/// is a server-side failure the caller may retry. Nothing is retried inside the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("no feasible route: {0}")]
    NoFeasibleRoute(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl PlanError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        PlanError::InvalidInput(msg.into())
    }

    /// Whether the failure is the caller's to fix (bad request, unroutable data).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PlanError::InvalidInput(_) | PlanError::NoFeasibleRoute(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PlanError::UpstreamUnavailable(_))
    }
}

impl From<reqwest::Error> for PlanError {
    fn from(err: reqwest::Error) -> Self {
        PlanError::UpstreamUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Unexpected(format!("serialization failed: {}", err))
    }
}

impl From<std::io::Error> for PlanError {
    fn from(err: std::io::Error) -> Self {
        PlanError::Unexpected(format!("io failure: {}", err))
    }
}
