//! Standard I/O binding.
//!
//! A single co-located peer exchanges newline-delimited JSON-RPC frames with
//! the server over stdin/stdout. No authentication applies.
//!
//! # Wire Format
//!
//! Each message is serialized as one line of JSON followed by `\n`. Blank
//! lines are ignored. A frame that is not JSON is answered with a `-32700`
//! error and one that is not a JSON-RPC message with `-32600`, both with a
//! null id. Frames over [`MAX_MESSAGE_SIZE`] are logged and dropped. In every
//! case the session continues.
//!
//! Logging must go to stderr so it never interleaves with protocol output.

use std::sync::Arc;

use medusa_mcp_core::protocol::{Message, Response};
use medusa_mcp_server::Server;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Maximum allowed frame size (16 MiB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A line-delimited JSON transport over a reader/writer pair.
pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    max_message_size: usize,
}

impl StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Create a transport over the process's stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport with custom streams, typically for tests.
    #[must_use]
    pub fn with_streams(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Override the frame size limit.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Write one frame.
    pub async fn send(&mut self, msg: &Message) -> Result<(), TransportError> {
        let json = serde_json::to_vec(msg)?;
        if json.len() > self.max_message_size {
            return Err(TransportError::MessageTooLarge {
                size: json.len(),
                max: self.max_message_size,
            });
        }

        self.writer.write_all(&json).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the next frame. Returns `Ok(None)` at end of input.
    pub async fn recv(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            let mut frame = Vec::new();
            let limit = u64::try_from(self.max_message_size)
                .unwrap_or(u64::MAX)
                .saturating_add(1);
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut frame)
                .await?;

            if read == 0 {
                return Ok(None);
            }

            let line = frame.strip_suffix(b"\n").unwrap_or(&frame);
            if line.len() > self.max_message_size {
                let size = line.len();
                discard_line(&mut self.reader).await?;
                return Err(TransportError::MessageTooLarge {
                    size,
                    max: self.max_message_size,
                });
            }

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Message::from_slice(line)
                .map(Some)
                .map_err(TransportError::Malformed);
        }
    }
}

/// Skip the rest of the current line without buffering it.
async fn discard_line<B: AsyncBufRead + Unpin>(reader: &mut B) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            reader.consume(pos + 1);
            return Ok(());
        }
        let len = buf.len();
        reader.consume(len);
    }
}

/// Serve `server` over `transport` until end of input or shutdown.
///
/// Messages are handled one at a time, so replies leave in arrival order.
pub async fn serve<R, W>(
    server: Arc<Server>,
    mut transport: StdioTransport<R, W>,
    shutdown: CancellationToken,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    tracing::info!(tools = server.catalog().len(), "Serving MCP over stdio");

    loop {
        let next = tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!("Shutdown requested, closing stdio session");
                break;
            }
            next = transport.recv() => next,
        };

        match next {
            Ok(Some(message)) => {
                if let Some(reply) = server.handle(message).await {
                    transport.send(&reply).await?;
                }
            }
            Ok(None) => {
                tracing::info!("stdin closed, ending session");
                break;
            }
            Err(TransportError::Malformed(err)) => {
                tracing::warn!(error = %err, "Answering malformed frame");
                let reply = Response::unattributed(&err);
                transport.send(&Message::Response(reply)).await?;
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "Dropping malformed frame");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}
