//! # Feedbus
//!
//! A Rust client for the feed bus publish/subscribe protocol.
//!
//! A [`Client`] holds a single TCP connection to a broker. It publishes data
//! to feed/topic pairs, sends data to individual clients, and manages
//! subscription, notification and monitor registrations. A receive loop
//! decodes inbound frames and queues them for the application to read.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use feedbus_proto as proto;

/// Error types for the feed bus client
pub mod error;

/// Connection configuration
pub mod config;

/// Payload serializers
pub mod serializer;

/// Client protocol engine
pub mod client;

pub use client::{Client, ClientState};
pub use config::ClientConfig;
pub use error::FeedbusError;
pub use feedbus_proto::{Message, MessageType};
#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;
pub use serializer::{ByteSerializer, JsonSerializer, StringSerializer};

/// Result type alias for feed bus operations
pub type Result<T> = std::result::Result<T, FeedbusError>;
