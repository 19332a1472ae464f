//! Channel Layer for the Call Client
//!
//! Abstracts the duplex connection to the peer. Provides:
//! - Channel trait: blocking send-one / receive-one interface
//! - ChannelError: failures surfaced by any channel
//! - StreamChannel: newline-delimited JSON over caller-supplied streams

use std::io::{self, BufRead, Read, Write};
use std::sync::Mutex;

use log::trace;
use xeth_protocol::codec::{decode_line, encode_line, CodecError};
use xeth_protocol::{Request, Response};

/// Default upper bound on a single response line (16 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Duplex channel to a JSON-RPC peer.
///
/// Both calls block. Timeouts, reconnection and buffering policy belong to the
/// implementation; the client expects exactly one response per request sent.
pub trait Channel: Send + Sync {
    /// Hand one request to the peer.
    fn send(&self, request: &Request) -> Result<(), ChannelError>;

    /// Block until one decoded response is available.
    fn receive(&self) -> Result<Response, ChannelError>;
}

/// Channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Channel timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),

    #[error("Failed to decode response: {0}")]
    Decode(serde_json::Error),

    #[error("Response line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("{0}")]
    Other(String),
}

impl ChannelError {
    /// True when the peer side is gone and no further traffic is possible.
    pub fn is_closed(&self) -> bool {
        matches!(self, ChannelError::Closed)
    }
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => ChannelError::Closed,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ChannelError::Timeout,
            _ => ChannelError::Io(err),
        }
    }
}

/// Newline-delimited JSON channel over a reader/writer pair.
///
/// Each request is written as one line and flushed; each response is read as
/// one line. Blank lines between responses are skipped. Reader and writer are
/// locked independently.
pub struct StreamChannel<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    max_line_bytes: usize,
}

impl<R, W> StreamChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Wrap an already-connected reader/writer pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_line_bytes(reader, writer, DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(reader: R, writer: W, max_line_bytes: usize) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            max_line_bytes,
        }
    }

    /// Give back the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        let reader = self.reader.into_inner().unwrap_or_else(|e| e.into_inner());
        let writer = self.writer.into_inner().unwrap_or_else(|e| e.into_inner());
        (reader, writer)
    }

    fn read_frame(&self, reader: &mut R) -> Result<Vec<u8>, ChannelError> {
        let limit = self.max_line_bytes as u64 + 1;
        let mut line = Vec::new();
        let n = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;

        if n == 0 {
            return Err(ChannelError::Closed);
        }
        if line.len() > self.max_line_bytes && line.last() != Some(&b'\n') {
            skip_rest_of_line(reader)?;
            return Err(ChannelError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }
        Ok(line)
    }
}

/// Discard input up to and including the next newline, or to EOF.
fn skip_rest_of_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}

impl<R, W> Channel for StreamChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn send(&self, request: &Request) -> Result<(), ChannelError> {
        let line = encode_line(request).map_err(|e| match e {
            CodecError::Json(e) => ChannelError::Encode(e),
            CodecError::Empty => ChannelError::Other("Empty request frame".to_string()),
        })?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ChannelError::Other("Writer lock poisoned".to_string()))?;
        writer.write_all(&line)?;
        writer.flush()?;

        trace!("wrote {} byte frame for request {}", line.len(), request.id);
        Ok(())
    }

    fn receive(&self) -> Result<Response, ChannelError> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| ChannelError::Other("Reader lock poisoned".to_string()))?;

        loop {
            let line = self.read_frame(&mut reader)?;
            match decode_line(&line) {
                Ok(response) => return Ok(response),
                Err(CodecError::Empty) => continue,
                Err(CodecError::Json(e)) => return Err(ChannelError::Decode(e)),
            }
        }
    }
}
