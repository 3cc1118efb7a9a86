//! Connection Handler Module
//!
//! Each client gets its own task that runs a read / decode / execute /
//! encode loop until the client goes away.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  read bytes into buffer      │
//!    │  decode every whole frame    │
//!    │  execute + encode each one   │
//!    │  flush replies               │
//!    │  [loop back]                 │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. EOF, I/O error or protocol error
//!        │
//!        ▼
//! 5. Handler task ends
//! ```
//!
//! A malformed frame gets exactly one `-ERR Protocol error: ...` reply and
//! then the connection is closed, since the stream position is lost.
//!
//! The handler is generic over the byte stream so it runs the same way on a
//! `TcpStream` and on an in-memory mock.

use crate::commands::CommandHandler;
use crate::protocol::parser::MAX_BULK_SIZE;
use crate::protocol::{encode_error, encode_result, FrameParser, ParseError};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace, warn};

/// Default cap on undecoded bytes: one maximum-size bulk string plus room
/// for the frame headers around it.
pub const MAX_BUFFER_SIZE: usize = MAX_BULK_SIZE + 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Counters shared by every connection of one server.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands executed (successful or not)
    pub commands_processed: AtomicU64,
    /// Commands that ended in an error reply
    pub command_errors: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self, failed: bool) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.command_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed frame; the client has already been told
    #[error("Protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("Client disconnected")]
    ClientDisconnected,

    /// EOF in the middle of a frame
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Serves one client over any async byte stream.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes read but not yet decoded
    buffer: BytesMut,

    /// Encoded replies waiting to be written
    out: BytesMut,

    /// Largest number of undecoded bytes held before giving up
    max_buffer: usize,

    command_handler: CommandHandler,
    parser: FrameParser,
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            out: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            max_buffer: MAX_BUFFER_SIZE,
            command_handler,
            parser: FrameParser::new(),
            stats,
        }
    }

    /// Overrides the cap on undecoded bytes.
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    /// Runs the connection until the client disconnects or an error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let drained = self.execute_buffered();
            self.send_replies().await?;
            drained?;

            if let Err(e) = self.read_more_data().await {
                if matches!(e, ConnectionError::BufferFull) {
                    let message = format!(
                        "ERR Protocol error: command exceeds {} bytes",
                        self.max_buffer
                    );
                    encode_error(&message, &mut self.out);
                    self.send_replies().await?;
                }
                return Err(e);
            }
        }
    }

    /// Executes every whole frame in the buffer, encoding replies into `out`.
    ///
    /// On a malformed frame the protocol error reply is queued and the error
    /// is returned so the caller closes after flushing.
    fn execute_buffered(&mut self) -> Result<(), ConnectionError> {
        loop {
            match self.parser.parse(&self.buffer) {
                Ok(Some((frame, consumed))) => {
                    let _ = self.buffer.split_to(consumed);
                    trace!(
                        client = %self.addr,
                        command = %frame.name_lossy(),
                        remaining = self.buffer.len(),
                        "Parsed command"
                    );

                    let result = self.command_handler.execute(&frame);
                    self.stats.command_processed(result.is_err());
                    encode_result(&result, &mut self.out);
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(client = %self.addr, error = %e, "Protocol error");
                    encode_error(&format!("ERR Protocol error: {}", e), &mut self.out);
                    self.buffer.clear();
                    return Err(ConnectionError::Protocol(e));
                }
            }
        }
    }

    async fn send_replies(&mut self) -> Result<(), ConnectionError> {
        if self.out.is_empty() {
            return Ok(());
        }

        let bytes = self.out.split();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent replies");
        Ok(())
    }

    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= self.max_buffer {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;
        if n == 0 {
            return if self.buffer.is_empty() {
                Err(ConnectionError::ClientDisconnected)
            } else {
                Err(ConnectionError::UnexpectedEof)
            };
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");
        Ok(())
    }
}

/// Creates a [`ConnectionHandler`] and runs it to completion.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
