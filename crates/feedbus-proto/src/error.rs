//! Error types for protocol operations

use std::io;
use thiserror::Error;

/// Broad classification of a [`ProtocolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The underlying stream failed or ended mid-frame
    Transport,
    /// The peer sent bytes that do not form a valid frame
    Protocol,
    /// The caller asked to encode something the wire format cannot carry
    Usage,
}

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended before a complete value could be read
    #[error("Stream closed early while reading a {needed}-byte value")]
    StreamClosedEarly {
        /// Number of bytes that were requested
        needed: usize,
    },

    /// Unknown message type tag
    #[error("Unrecognized message type: {0}")]
    UnrecognizedMessageType(u8),

    /// Negative payload length on the wire
    #[error("Invalid payload length: {0}")]
    InvalidLength(i32),

    /// String bytes were not valid UTF-8
    #[error("Invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// String too long for its 16-bit length prefix
    #[error("String too long: {len} bytes (max: {max})")]
    StringTooLong {
        /// Encoded length of the string
        len: usize,
        /// Maximum encodable length
        max: usize,
    },

    /// Payload larger than the codec accepts
    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
        /// Whether the payload came off the wire rather than from the caller
        inbound: bool,
    },
}

impl ProtocolError {
    /// Classify the error as a transport, protocol or usage failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::StreamClosedEarly { .. } => ErrorCategory::Transport,
            Self::UnrecognizedMessageType(_)
            | Self::InvalidLength(_)
            | Self::InvalidUtf8(_) => ErrorCategory::Protocol,
            Self::StringTooLong { .. } => ErrorCategory::Usage,
            Self::PayloadTooLarge { inbound, .. } => {
                if *inbound {
                    ErrorCategory::Protocol
                } else {
                    ErrorCategory::Usage
                }
            }
        }
    }

    /// Whether the connection can no longer be used after this error
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Usage
    }
}
