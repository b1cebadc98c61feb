//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error("empty message")]
    EmptyMessage,
}
