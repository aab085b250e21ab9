//! Tagged message codec for async streams

use crate::io::{DataReader, DataWriter};
use crate::message::{Message, MessageType};
use crate::ProtocolError;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

/// Maximum payload size (16MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Largest payload the `i32` length prefix can describe
const WIRE_PAYLOAD_LIMIT: usize = i32::MAX as usize;

/// Encodes and decodes one [`Message`] per call over a data stream.
///
/// Every frame is a one-byte [`MessageType`] tag followed by the fields of
/// that variant in a fixed order. Data payloads are prefixed by an `i32`
/// byte count.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    /// Maximum payload size accepted in either direction
    max_payload_size: usize,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec {
    /// Create a new codec with default settings
    pub fn new() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }

    /// Create a new codec with a custom max payload size
    pub fn with_max_payload_size(max_payload_size: usize) -> Self {
        Self {
            max_payload_size: max_payload_size.min(WIRE_PAYLOAD_LIMIT),
        }
    }

    /// Get the max payload size
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Encode a message and flush it to the writer.
    ///
    /// If a field cannot be encoded, the partial frame is dropped from the
    /// writer's buffer and nothing reaches the stream.
    pub async fn write_message<W>(
        &self,
        writer: &mut DataWriter<W>,
        message: &Message,
    ) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        let mark = writer.buffered();
        if let Err(e) = self.encode(writer, message) {
            writer.truncate(mark);
            return Err(e);
        }
        writer.flush().await
    }

    /// Encode a message into a standalone frame
    pub fn encode_frame(&self, message: &Message) -> Result<Bytes, ProtocolError> {
        let mut writer = DataWriter::new(tokio::io::sink());
        self.encode(&mut writer, message)?;
        Ok(writer.take_buffered())
    }

    /// Buffer the tag and fields of a message without flushing
    pub fn encode<W>(&self, writer: &mut DataWriter<W>, message: &Message) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_u8(message.message_type().tag());

        match message {
            Message::MulticastData { feed, topic, is_image, payload } => {
                writer.write_utf(feed)?;
                writer.write_utf(topic)?;
                writer.write_bool(*is_image);
                self.write_payload(writer, payload)?;
            }
            Message::UnicastData { client_id, feed, topic, is_image, payload } => {
                writer.write_utf(client_id)?;
                writer.write_utf(feed)?;
                writer.write_utf(topic)?;
                writer.write_bool(*is_image);
                self.write_payload(writer, payload)?;
            }
            Message::ForwardedSubscriptionRequest { client_id, feed, topic, is_add } => {
                writer.write_utf(client_id)?;
                writer.write_utf(feed)?;
                writer.write_utf(topic)?;
                writer.write_bool(*is_add);
            }
            Message::NotificationRequest { feed, is_add } => {
                writer.write_utf(feed)?;
                writer.write_bool(*is_add);
            }
            Message::SubscriptionRequest { feed, topic, is_add } => {
                writer.write_utf(feed)?;
                writer.write_utf(topic)?;
                writer.write_bool(*is_add);
            }
            Message::MonitorRequest { feed, is_add } => {
                writer.write_utf(feed)?;
                writer.write_bool(*is_add);
            }
        }

        Ok(())
    }

    /// Read exactly one message from the reader
    pub async fn read_message<R>(&self, reader: &mut DataReader<R>) -> Result<Message, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let message_type = MessageType::try_from(reader.read_u8().await?)?;

        let message = match message_type {
            MessageType::MulticastData => Message::MulticastData {
                feed: reader.read_utf().await?,
                topic: reader.read_utf().await?,
                is_image: reader.read_bool().await?,
                payload: self.read_payload(reader).await?,
            },
            MessageType::UnicastData => Message::UnicastData {
                client_id: reader.read_utf().await?,
                feed: reader.read_utf().await?,
                topic: reader.read_utf().await?,
                is_image: reader.read_bool().await?,
                payload: self.read_payload(reader).await?,
            },
            MessageType::ForwardedSubscriptionRequest => Message::ForwardedSubscriptionRequest {
                client_id: reader.read_utf().await?,
                feed: reader.read_utf().await?,
                topic: reader.read_utf().await?,
                is_add: reader.read_bool().await?,
            },
            MessageType::NotificationRequest => Message::NotificationRequest {
                feed: reader.read_utf().await?,
                is_add: reader.read_bool().await?,
            },
            MessageType::SubscriptionRequest => Message::SubscriptionRequest {
                feed: reader.read_utf().await?,
                topic: reader.read_utf().await?,
                is_add: reader.read_bool().await?,
            },
            MessageType::MonitorRequest => Message::MonitorRequest {
                feed: reader.read_utf().await?,
                is_add: reader.read_bool().await?,
            },
        };

        Ok(message)
    }

    fn write_payload<W>(&self, writer: &mut DataWriter<W>, payload: &Bytes) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        self.check_payload_size(payload.len(), false)?;
        writer.write_i32(payload.len() as i32);
        writer.write_fully(payload);
        Ok(())
    }

    async fn read_payload<R>(&self, reader: &mut DataReader<R>) -> Result<Bytes, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let len = reader.read_i32().await?;
        if len < 0 {
            return Err(ProtocolError::InvalidLength(len));
        }
        self.check_payload_size(len as usize, true)?;
        reader.read_fully(len as usize).await
    }

    fn check_payload_size(&self, size: usize, inbound: bool) -> Result<(), ProtocolError> {
        if size > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                size,
                max: self.max_payload_size,
                inbound,
            });
        }
        Ok(())
    }
}
