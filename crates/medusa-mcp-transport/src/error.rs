//! Transport error types.

use medusa_mcp_core::McpError;
use thiserror::Error;

/// Errors raised while moving frames over a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be serialized or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame was not JSON, or not a JSON-RPC message.
    #[error("Malformed frame: {0}")]
    Malformed(McpError),

    /// A frame exceeded the size limit.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual frame size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

impl TransportError {
    /// Whether the session can continue after this error.
    ///
    /// Malformed or oversized frames are dropped; I/O failures end the session.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Json(_) | Self::Malformed(_) | Self::MessageTooLarge { .. }
        )
    }
}
