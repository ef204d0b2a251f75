//! Pool error types.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Identifies a target for removal or weight updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetId {
    /// Match by scheme, host, port and path.
    Address(Url),
    /// Match by the target's configured name.
    Name(String),
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Address(url) => write!(f, "{}", url),
            TargetId::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Errors returned synchronously by pool mutations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// An add/construct call received no targets.
    #[error("target list is empty")]
    EmptyInput,

    /// No current target matched the identifier.
    #[error("target {0} not found")]
    NotFound(TargetId),

    /// A target address could not be parsed.
    #[error("invalid target address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
