//! Payload serializers
//!
//! Data frames carry opaque bytes. A [`ByteSerializer`] turns application
//! values into those bytes on publish and back again on receipt. Control
//! frames never pass through the serializer.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Converts application values to and from data frame payloads
pub trait ByteSerializer: Send + Sync {
    /// Application value carried in data frames
    type Value: Send + 'static;

    /// Error raised when a value cannot be converted
    type Error: std::error::Error + Send + Sync + 'static;

    /// Encode a value into payload bytes
    fn serialize(&self, value: &Self::Value) -> Result<Vec<u8>, Self::Error>;

    /// Decode payload bytes into a value
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, Self::Error>;
}

/// JSON payloads encoded as UTF-8 text
pub struct JsonSerializer<T = serde_json::Value> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonSerializer")
    }
}

impl<T> ByteSerializer for JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;
    type Error = serde_json::Error;

    fn serialize(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(value)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Plain UTF-8 string payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl ByteSerializer for StringSerializer {
    type Value = String;
    type Error = std::str::Utf8Error;

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Self::Error> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        std::str::from_utf8(bytes).map(str::to_owned)
    }
}

/// MessagePack payloads
#[cfg(feature = "msgpack")]
pub struct MsgPackSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

#[cfg(feature = "msgpack")]
impl<T> MsgPackSerializer<T> {
    /// Create a new MessagePack serializer
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[cfg(feature = "msgpack")]
impl<T> Default for MsgPackSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "msgpack")]
impl<T> fmt::Debug for MsgPackSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MsgPackSerializer")
    }
}

/// Error raised by [`MsgPackSerializer`]
#[cfg(feature = "msgpack")]
#[derive(Debug, thiserror::Error)]
pub enum MsgPackError {
    /// Encoding failed
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Decoding failed
    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

#[cfg(feature = "msgpack")]
impl<T> ByteSerializer for MsgPackSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;
    type Error = MsgPackError;

    fn serialize(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Quote {
        name: String,
        bid: f64,
        ask: f64,
    }

    #[test]
    fn test_json_value_payload() {
        let serializer = JsonSerializer::<serde_json::Value>::new();
        let value = json!({"BID": 1.23});

        let bytes = serializer.serialize(&value).unwrap();
        assert_eq!(bytes, br#"{"BID":1.23}"#.to_vec());
        assert_eq!(serializer.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn test_json_typed_payload() {
        let serializer = JsonSerializer::<Quote>::new();
        let quote = Quote {
            name: "Sainsbury PLC".to_string(),
            bid: 1.23,
            ask: 1.32,
        };

        let bytes = serializer.serialize(&quote).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), quote);
        assert!(serializer.deserialize(b"not json").is_err());
    }

    #[test]
    fn test_string_payload() {
        let serializer = StringSerializer;
        let bytes = serializer.serialize(&"héllo".to_string()).unwrap();
        assert_eq!(bytes, "héllo".as_bytes());
        assert_eq!(serializer.deserialize(&bytes).unwrap(), "héllo");
        assert!(serializer.deserialize(&[0xff, 0xfe]).is_err());
    }

    #[cfg(feature = "msgpack")]
    #[test]
    fn test_msgpack_payload() {
        let serializer = MsgPackSerializer::<Quote>::new();
        let quote = Quote {
            name: "Tesco".to_string(),
            bid: 2.5,
            ask: 2.75,
        };

        let bytes = serializer.serialize(&quote).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), quote);
        assert!(matches!(
            serializer.deserialize(&[0xc1]),
            Err(MsgPackError::Decode(_))
        ));
    }
}
