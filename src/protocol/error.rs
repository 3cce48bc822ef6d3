//! Error types for volt-client.

use thiserror::Error;

/// Wire engine error types.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Connection failed: {0}")]
    Disconnected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read: needed {needed} bytes, {remaining} left in buffer")]
    ShortRead { needed: usize, remaining: usize },

    #[error("Malformed wire data: {0}")]
    Malformed(String),

    #[error("Unsupported wire type ({0})")]
    UnsupportedType(i8),

    #[error("Value out of range: {0}")]
    Domain(String),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Timeout")]
    Timeout,
}

impl WireError {
    /// Classify a raw I/O failure from the stream. Deadline expiry and peer
    /// shutdown get their own kinds; anything else stays an I/O error.
    pub(crate) fn from_io(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => WireError::Timeout,
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected => WireError::Disconnected(e.to_string()),
            _ => WireError::Io(e),
        }
    }

    /// Whether this failure leaves the session in an indeterminate state.
    /// The read cursor or the stream itself can no longer be trusted, so the
    /// session must fail fast afterwards.
    pub(crate) fn poisons(&self) -> bool {
        matches!(
            self,
            WireError::Disconnected(_)
                | WireError::Io(_)
                | WireError::ShortRead { .. }
                | WireError::Malformed(_)
                | WireError::Timeout
                | WireError::AuthFailed
        )
    }
}

/// Result type for wire operations.
pub type VoltResult<T> = Result<T, WireError>;
