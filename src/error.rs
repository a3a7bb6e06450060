use crate::types::Chain;
use thiserror::Error;

/// Failures surfaced by connectors and the commitment resolver.
///
/// The resolver never retries or logs these; they are handed to the caller
/// as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Upstream unreachable, timed out, or answered with a transport error
    #[error("{chain} upstream unavailable: {message}")]
    Connectivity { chain: Chain, message: String },
    /// Oracle call went through but its answer was unusable
    #[error("oracle query failed: {0}")]
    OracleQuery(String),
    /// Transaction or receipt is unknown to the node
    #[error("not found: {0}")]
    NotFound(String),
    /// Malformed client input, rejected before any upstream call
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Contract call reverted
    #[error("contract call reverted: {0}")]
    Revert(String),
}

impl ResolveError {
    pub fn connectivity(chain: Chain, message: impl Into<String>) -> Self {
        ResolveError::Connectivity {
            chain,
            message: message.into(),
        }
    }

    /// Only transport-level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolveError::Connectivity { .. })
    }
}
