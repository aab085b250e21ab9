//! # Feed Bus Protocol
//!
//! Binary stream primitives, message types and the tagged wire codec for the
//! feed bus publish/subscribe protocol.

#![warn(missing_docs)]

/// Typed big-endian read/write primitives
pub mod io;

/// Message types and enums
pub mod message;

/// Tagged message codec for async streams
pub mod codec;

/// Error types for protocol operations
pub mod error;

pub use codec::{MessageCodec, MAX_PAYLOAD_SIZE};
pub use error::{ErrorCategory, ProtocolError};
pub use io::{DataReader, DataWriter, MAX_UTF_LENGTH};
pub use message::{Message, MessageType};
