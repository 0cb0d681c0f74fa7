//! CRLF-delimited line reading with an inactivity timeout.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// How long a single read may stall before the line is abandoned.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 4096;

/// Errors produced while waiting for a complete line.
///
/// The timeout and EOF variants carry whatever bytes arrived before the
/// failure so callers can tell an idle peer from a half-sent request.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("timed out waiting for line terminator ({} bytes pending)", .partial.len())]
    Timeout { partial: Vec<u8> },

    #[error("stream ended before line terminator ({} bytes pending)", .partial.len())]
    UnexpectedEof { partial: Vec<u8> },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl LineError {
    /// Number of bytes received for the unfinished line.
    pub fn partial_len(&self) -> usize {
        match self {
            LineError::Timeout { partial } | LineError::UnexpectedEof { partial } => partial.len(),
            LineError::Io(_) => 0,
        }
    }
}

/// A single line read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line contents with the `\r\n` terminator stripped.
    pub text: String,
    /// Bytes consumed from the stream, terminator included.
    pub consumed: usize,
}

/// Buffered line reader that owns the underlying stream.
///
/// Bytes received past the end of a line stay buffered for the next call,
/// so back-to-back requests on one connection are not lost.
pub struct LineReader<S> {
    stream: S,
    buffer: BytesMut,
    /// Prefix of `buffer` already searched for a terminator.
    scanned: usize,
    read_timeout: Duration,
}

impl<S> LineReader<S> {
    pub fn new(stream: S) -> Self {
        Self::with_timeout(stream, DEFAULT_READ_TIMEOUT)
    }

    pub fn with_timeout(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            read_timeout,
        }
    }

    /// Mutable access to the stream, used for writing responses.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn take_line(&mut self) -> Option<Line> {
        // Back up one byte in case a `\r` was the last thing seen.
        let start = self.scanned.saturating_sub(1);
        let Some(offset) = self.buffer[start..].windows(2).position(|w| w == b"\r\n") else {
            self.scanned = self.buffer.len();
            return None;
        };
        let end = start + offset;
        self.scanned = 0;
        let text = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
        self.buffer.advance(end + 2);
        Some(Line {
            text,
            consumed: end + 2,
        })
    }
}

impl<S: AsyncRead + Unpin> LineReader<S> {
    /// Reads until the next `\r\n`, re-arming the timeout before every read.
    pub async fn read_line(&mut self) -> Result<Line, LineError> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }

            self.buffer.reserve(READ_CHUNK);
            let n = match timeout(self.read_timeout, self.stream.read_buf(&mut self.buffer)).await {
                Ok(result) => result?,
                Err(_) => {
                    self.scanned = 0;
                    let partial = self.buffer.split().to_vec();
                    return Err(LineError::Timeout { partial });
                }
            };

            if n == 0 {
                self.scanned = 0;
                let partial = self.buffer.split().to_vec();
                return Err(LineError::UnexpectedEof { partial });
            }
        }
    }
}
