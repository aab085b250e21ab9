//! Error types for the feed bus client

use feedbus_proto::ProtocolError;
use std::error::Error as StdError;
use thiserror::Error;

/// Main error type for feed bus client operations
#[derive(Debug, Error)]
pub enum FeedbusError {
    /// Could not open the connection
    #[error("Connection error: failed to connect to {addr}: {source}")]
    Connection {
        /// Address that was dialled
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Wire protocol or transport errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An outbound value could not be serialized
    #[error("Serializer error: {0}")]
    Serializer(#[source] Box<dyn StdError + Send + Sync>),

    /// An inbound payload could not be deserialized; ends the receive loop
    #[error("Deserializer error: {0}")]
    Deserializer(#[source] Box<dyn StdError + Send + Sync>),

    /// The receive loop was already started
    #[error("Client already started")]
    AlreadyStarted,

    /// Stop was requested; no further requests are accepted
    #[error("Client stopped")]
    Stopped,

    /// The receive loop has exited and the queue is drained
    #[error("Client closed: no more messages will be received")]
    Closed,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedbusError {
    /// Wrap an error raised by a serializer
    pub fn serializer<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Serializer(Box::new(err))
    }

    /// Wrap an error raised while deserializing an inbound payload
    pub fn deserializer<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Deserializer(Box::new(err))
    }

    /// Whether the connection is unusable after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_fatal(),
            Self::Serializer(_) | Self::Config(_) | Self::AlreadyStarted => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializer_error_is_preserved() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let message = cause.to_string();
        let err = FeedbusError::serializer(cause);

        assert!(!err.is_fatal());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), message);
        assert!(source.downcast_ref::<serde_json::Error>().is_some());
    }

    #[test]
    fn test_deserializer_error_is_fatal() {
        let cause = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = FeedbusError::deserializer(cause);

        assert!(err.is_fatal());
        assert!(err.source().unwrap().downcast_ref::<serde_json::Error>().is_some());
        assert!(err.to_string().starts_with("Deserializer error: "));
    }

    #[test]
    fn test_fatality() {
        assert!(FeedbusError::Closed.is_fatal());
        assert!(FeedbusError::Protocol(ProtocolError::UnrecognizedMessageType(7)).is_fatal());
        assert!(!FeedbusError::Protocol(ProtocolError::StringTooLong { len: 70000, max: 65535 }).is_fatal());
    }
}
