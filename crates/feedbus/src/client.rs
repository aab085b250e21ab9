//! Client protocol engine
//!
//! A [`Client`] owns one broker connection. The read half is driven by the
//! receive loop ([`Client::start`]), which decodes inbound frames, turns data
//! payloads into application values and queues the results for
//! [`Client::read`]. Outbound requests encode and flush one frame at a time
//! under an exclusive lock on the write half.

use crate::config::ClientConfig;
use crate::serializer::ByteSerializer;
use crate::{FeedbusError, Result};
use bytes::Bytes;
use feedbus_proto::{DataReader, DataWriter, Message, MessageCodec};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Lifecycle of a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Connected, receive loop not started
    Connected,
    /// Receive loop is running
    Running,
    /// Receive loop exited after a stop request
    Stopped,
    /// The broker closed the connection
    Closed,
    /// The receive loop failed
    Faulted,
}

impl ClientState {
    /// Whether the receive loop has ended for good
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Closed | Self::Faulted)
    }
}

/// Everything the receive loop takes ownership of when it starts
struct ReceiveHalf<R, V> {
    reader: DataReader<R>,
    queue_tx: mpsc::UnboundedSender<Message<V>>,
}

/// Feed bus client bound to a single connection
pub struct Client<S, R = OwnedReadHalf, W = OwnedWriteHalf>
where
    S: ByteSerializer,
{
    /// Read side and queue producer, taken by the receive loop
    receive_half: Mutex<Option<ReceiveHalf<R, S::Value>>>,
    /// Write side, held for one complete frame at a time
    writer: Mutex<DataWriter<W>>,
    /// Consumer end of the receive queue
    queue_rx: Mutex<mpsc::UnboundedReceiver<Message<S::Value>>>,
    /// Frame codec
    codec: MessageCodec,
    /// Payload serializer
    serializer: S,
    /// Cooperative stop signal
    stop_token: CancellationToken,
    /// Observable connection state
    state: watch::Sender<ClientState>,
}

impl<S> Client<S>
where
    S: ByteSerializer,
{
    /// Connect to a broker over TCP
    pub async fn connect(host: &str, port: u16, serializer: S) -> Result<Self> {
        Self::connect_with_config(&ClientConfig::new(host, port), serializer).await
    }

    /// Connect to the broker named by a configuration
    pub async fn connect_with_config(config: &ClientConfig, serializer: S) -> Result<Self> {
        let addr = config.address();
        info!("Connecting to {}", addr);

        let stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(|source| FeedbusError::Connection {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;

        let (reader, writer) = stream.into_split();
        let codec = MessageCodec::with_max_payload_size(config.max_payload_size);

        info!("Connected to {}", addr);
        Ok(Self::with_codec(reader, writer, serializer, codec))
    }
}

impl<S, R, W> Client<S, R, W>
where
    S: ByteSerializer,
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a client over an existing reader/writer pair
    pub fn from_parts(reader: R, writer: W, serializer: S) -> Self {
        Self::with_codec(reader, writer, serializer, MessageCodec::new())
    }

    /// Create a client over an existing reader/writer pair with a custom codec
    pub fn with_codec(reader: R, writer: W, serializer: S, codec: MessageCodec) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ClientState::Connected);

        Self {
            receive_half: Mutex::new(Some(ReceiveHalf {
                reader: DataReader::new(reader),
                queue_tx,
            })),
            writer: Mutex::new(DataWriter::new(writer)),
            queue_rx: Mutex::new(queue_rx),
            codec,
            serializer,
            stop_token: CancellationToken::new(),
            state,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ClientState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions
    pub fn state_changes(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    /// Run the receive loop until stopped, closed by the broker, or failed.
    ///
    /// Each inbound frame is decoded in full, data payloads are deserialized,
    /// and the result is queued for [`read`](Self::read). A stop request is
    /// observed between frames. Frames that have already started arriving,
    /// including any already buffered from the stream, are finished and queued
    /// first. The loop can only be run once.
    pub async fn start(&self) -> Result<()> {
        let ReceiveHalf { mut reader, queue_tx } = self
            .receive_half
            .lock()
            .await
            .take()
            .ok_or(FeedbusError::AlreadyStarted)?;

        self.state.send_replace(ClientState::Running);
        info!("Receive loop started");

        match self.receive_loop(&mut reader, &queue_tx).await {
            Ok(state) => {
                info!("Receive loop exited: {:?}", state);
                self.state.send_replace(state);
                Ok(())
            }
            Err(e) => {
                error!("Receive loop failed: {}", e);
                self.state.send_replace(ClientState::Faulted);
                Err(e)
            }
        }
    }

    async fn receive_loop(
        &self,
        reader: &mut DataReader<R>,
        queue_tx: &mpsc::UnboundedSender<Message<S::Value>>,
    ) -> Result<ClientState> {
        loop {
            debug!("Waiting for event");

            tokio::select! {
                biased;

                ready = reader.ready() => {
                    if !ready? {
                        info!("Connection closed by broker");
                        return Ok(ClientState::Closed);
                    }

                    self.receive_message(reader, queue_tx).await?;

                    if self.stop_token.is_cancelled() {
                        // Frames already pulled off the stream still reach the queue
                        while reader.has_buffered() {
                            self.receive_message(reader, queue_tx).await?;
                        }
                        debug!("Exiting loop");
                        return Ok(ClientState::Stopped);
                    }
                }

                _ = self.stop_token.cancelled() => {
                    debug!("Exiting loop");
                    return Ok(ClientState::Stopped);
                }
            }
        }
    }

    async fn receive_message(
        &self,
        reader: &mut DataReader<R>,
        queue_tx: &mpsc::UnboundedSender<Message<S::Value>>,
    ) -> Result<()> {
        let message = self.codec.read_message(reader).await?;
        debug!(
            "Received {} for feed {:?}",
            message.message_type(),
            message.feed()
        );

        let message = self.decode_payload(message)?;
        // The receiver lives as long as the client, so this cannot fail
        let _ = queue_tx.send(message);
        Ok(())
    }

    /// Request the receive loop to exit.
    ///
    /// The transport stays open and queued messages remain readable. Further
    /// outbound requests are refused.
    pub fn stop(&self) {
        if !self.stop_token.is_cancelled() {
            debug!("Stop requested");
            self.stop_token.cancel();
        }
    }

    /// Stop, then shut down the write half so the broker sees end-of-stream
    pub async fn close(&self) -> Result<()> {
        self.stop();
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        info!("Connection closed");
        Ok(())
    }

    /// Wait for the next received message.
    ///
    /// Returns [`FeedbusError::Closed`] once the receive loop has exited and
    /// every queued message has been read.
    pub async fn read(&self) -> Result<Message<S::Value>> {
        let mut queue_rx = self.queue_rx.lock().await;
        queue_rx.recv().await.ok_or(FeedbusError::Closed)
    }

    /// Publish a value to every subscriber of a feed/topic
    pub async fn publish(&self, feed: &str, topic: &str, is_image: bool, value: &S::Value) -> Result<()> {
        let payload = self.encode_payload(value)?;
        self.write_message(&Message::multicast_data(feed, topic, is_image, payload))
            .await
    }

    /// Send a value to a single client
    pub async fn send(
        &self,
        client_id: &str,
        feed: &str,
        topic: &str,
        is_image: bool,
        value: &S::Value,
    ) -> Result<()> {
        let payload = self.encode_payload(value)?;
        self.write_message(&Message::unicast_data(client_id, feed, topic, is_image, payload))
            .await
    }

    /// Subscribe to a feed/topic
    pub async fn add_subscription(&self, feed: &str, topic: &str) -> Result<()> {
        self.write_message(&Message::subscription_request(feed, topic, true))
            .await
    }

    /// Unsubscribe from a feed/topic
    pub async fn remove_subscription(&self, feed: &str, topic: &str) -> Result<()> {
        self.write_message(&Message::subscription_request(feed, topic, false))
            .await
    }

    /// Ask to be told about subscription changes on a feed
    pub async fn add_notification(&self, feed: &str) -> Result<()> {
        self.write_message(&Message::notification_request(feed, true))
            .await
    }

    /// Stop being told about subscription changes on a feed
    pub async fn remove_notification(&self, feed: &str) -> Result<()> {
        self.write_message(&Message::notification_request(feed, false))
            .await
    }

    /// Register a monitor on a feed
    pub async fn add_monitor(&self, feed: &str) -> Result<()> {
        self.write_message(&Message::monitor_request(feed, true)).await
    }

    /// Drop a monitor on a feed
    pub async fn remove_monitor(&self, feed: &str) -> Result<()> {
        self.write_message(&Message::monitor_request(feed, false)).await
    }

    fn encode_payload(&self, value: &S::Value) -> Result<Bytes> {
        self.serializer
            .serialize(value)
            .map(Bytes::from)
            .map_err(FeedbusError::serializer)
    }

    fn decode_payload(&self, message: Message) -> Result<Message<S::Value>> {
        message.try_map_payload(|payload| {
            self.serializer
                .deserialize(&payload)
                .map_err(FeedbusError::deserializer)
        })
    }

    async fn write_message(&self, message: &Message) -> Result<()> {
        if self.stop_token.is_cancelled() {
            return Err(FeedbusError::Stopped);
        }

        debug!(
            "Sending {} for feed {:?}",
            message.message_type(),
            message.feed()
        );

        let mut writer = self.writer.lock().await;
        self.codec.write_message(&mut *writer, message).await?;
        Ok(())
    }
}

impl<S, R, W> Client<S, R, W>
where
    S: ByteSerializer + 'static,
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Run the receive loop on a background task
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.start().await })
    }
}

impl<S, R, W> fmt::Debug for Client<S, R, W>
where
    S: ByteSerializer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &*self.state.borrow())
            .field("codec", &self.codec)
            .field("stop_requested", &self.stop_token.is_cancelled())
            .finish()
    }
}
