//! Typed big-endian read/write primitives over async byte streams
//!
//! [`DataReader`] and [`DataWriter`] know nothing about framing. They read and
//! write fixed-width integers, IEEE-754 floats, single-byte booleans,
//! length-prefixed UTF-8 strings and raw byte runs in network byte order.

use crate::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Largest string, in encoded bytes, that fits the 16-bit length prefix
pub const MAX_UTF_LENGTH: usize = u16::MAX as usize;

/// Initial capacity of the write buffer
const WRITE_BUFFER_CAPACITY: usize = 8192;

fn closed_early(err: io::Error, needed: usize) -> ProtocolError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::StreamClosedEarly { needed }
    } else {
        ProtocolError::Io(err)
    }
}

/// Reads typed values from an async byte stream
pub struct DataReader<R> {
    inner: BufReader<R>,
}

impl<R> DataReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
        }
    }

    /// Whether bytes already pulled from the stream are waiting to be read.
    ///
    /// Never touches the underlying reader.
    pub fn has_buffered(&self) -> bool {
        !self.inner.buffer().is_empty()
    }

    /// Wait until at least one byte can be read without blocking.
    ///
    /// Returns `false` when the stream is at end-of-input. Nothing is
    /// consumed, so the future can be dropped at any point without losing
    /// data.
    pub async fn ready(&mut self) -> Result<bool, ProtocolError> {
        let buf = self.inner.fill_buf().await?;
        Ok(!buf.is_empty())
    }

    /// Read a single-byte boolean; any nonzero byte is `true`
    pub async fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8().await? != 0)
    }

    /// Read a signed byte
    pub async fn read_i8(&mut self) -> Result<i8, ProtocolError> {
        self.inner.read_i8().await.map_err(|e| closed_early(e, 1))
    }

    /// Read an unsigned byte
    pub async fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        self.inner.read_u8().await.map_err(|e| closed_early(e, 1))
    }

    /// Read a big-endian `i16`
    pub async fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.inner.read_i16().await.map_err(|e| closed_early(e, 2))
    }

    /// Read a big-endian `u16`
    pub async fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        self.inner.read_u16().await.map_err(|e| closed_early(e, 2))
    }

    /// Read a big-endian `i32`
    pub async fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.inner.read_i32().await.map_err(|e| closed_early(e, 4))
    }

    /// Read a big-endian `u32`
    pub async fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.inner.read_u32().await.map_err(|e| closed_early(e, 4))
    }

    /// Read a big-endian `i64`
    pub async fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        self.inner.read_i64().await.map_err(|e| closed_early(e, 8))
    }

    /// Read a big-endian `u64`
    pub async fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        self.inner.read_u64().await.map_err(|e| closed_early(e, 8))
    }

    /// Read a big-endian IEEE-754 `f32`
    pub async fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        self.inner.read_f32().await.map_err(|e| closed_early(e, 4))
    }

    /// Read a big-endian IEEE-754 `f64`
    pub async fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        self.inner.read_f64().await.map_err(|e| closed_early(e, 8))
    }

    /// Read a UTF-8 string prefixed by its `u16` byte length
    pub async fn read_utf(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u16().await? as usize;
        let bytes = self.read_fully(len).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Read exactly `len` bytes
    pub async fn read_fully(&mut self, len: usize) -> Result<Bytes, ProtocolError> {
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .await
            .map_err(|e| closed_early(e, len))?;
        Ok(Bytes::from(buf))
    }
}

/// Buffers typed values and writes them to an async byte stream on flush
pub struct DataWriter<W> {
    inner: W,
    buf: BytesMut,
}

impl<W> DataWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            inner: writer,
            buf: BytesMut::with_capacity(WRITE_BUFFER_CAPACITY),
        }
    }

    /// Consume the data writer, returning the underlying writer.
    ///
    /// Bytes that were buffered but not flushed are discarded.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Number of bytes buffered and not yet flushed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard buffered bytes beyond `len`
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Take the buffered bytes without writing them to the stream
    pub fn take_buffered(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Buffer a single-byte boolean
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    /// Buffer a signed byte
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    /// Buffer an unsigned byte
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Buffer a big-endian `i16`
    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    /// Buffer a big-endian `u16`
    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Buffer a big-endian `i32`
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Buffer a big-endian `u32`
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Buffer a big-endian `i64`
    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// Buffer a big-endian `u64`
    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Buffer a big-endian IEEE-754 `f32`
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    /// Buffer a big-endian IEEE-754 `f64`
    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Buffer a UTF-8 string prefixed by its `u16` byte length.
    ///
    /// Strings whose encoding exceeds [`MAX_UTF_LENGTH`] are rejected and
    /// nothing is buffered.
    pub fn write_utf(&mut self, value: &str) -> Result<(), ProtocolError> {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_UTF_LENGTH {
            return Err(ProtocolError::StringTooLong {
                len: bytes.len(),
                max: MAX_UTF_LENGTH,
            });
        }
        self.buf.put_u16(bytes.len() as u16);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Buffer a raw byte run
    pub fn write_fully(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write all buffered bytes to the stream and flush it
    pub async fn flush(&mut self) -> Result<(), ProtocolError> {
        self.inner.write_all_buf(&mut self.buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Flush, then shut down the write side of the stream
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}
