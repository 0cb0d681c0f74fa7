use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::http::line::{DEFAULT_READ_TIMEOUT, LineReader};
use crate::http::parser::{ParseError, ParseFailure, read_request};
use crate::http::response::{Response, StatusCode, build_response};
use crate::http::writer::ResponseWriter;
use crate::vhost::VirtualHosts;

pub struct Connection<S> {
    reader: LineReader<S>,
    hosts: Arc<VirtualHosts>,
    peer: String,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Responding(Response),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, hosts: Arc<VirtualHosts>, peer: impl Into<String>) -> Self {
        Self::with_read_timeout(stream, hosts, peer, DEFAULT_READ_TIMEOUT)
    }

    pub fn with_read_timeout(
        stream: S,
        hosts: Arc<VirtualHosts>,
        peer: impl Into<String>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            reader: LineReader::with_timeout(stream, read_timeout),
            hosts,
            peer: peer.into(),
            state: ConnectionState::Reading,
        }
    }

    /// Serves requests until the peer goes away, a request asks to close,
    /// or a bad request is answered.
    ///
    /// Returns the number of responses written.
    pub async fn run(&mut self) -> usize {
        let mut served = 0;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match read_request(&mut self.reader).await {
                        Ok(req) => {
                            debug!(peer = %self.peer, host = %req.host, url = %req.url, "Request received");
                            let response = build_response(&self.hosts, Some(&req), StatusCode::Ok).await;
                            ConnectionState::Responding(response)
                        }
                        Err(failure) => self.on_parse_failure(failure).await,
                    };
                }

                ConnectionState::Responding(response) => {
                    let mut writer = ResponseWriter::new(&response);
                    if let Err(e) = writer.write_to_stream(self.reader.get_mut()).await {
                        warn!(peer = %self.peer, error = %e, "Failed to write response");
                        self.state = ConnectionState::Closed;
                        continue;
                    }
                    served += 1;
                    debug!(peer = %self.peer, status = response.status.as_u16(), "Response sent");

                    self.state = if response.close {
                        if let Err(e) = self.reader.get_mut().shutdown().await {
                            debug!(peer = %self.peer, error = %e, "Failed to shut down connection");
                        }
                        ConnectionState::Closed
                    } else {
                        ConnectionState::Reading // go back for next request
                    };
                }

                ConnectionState::Closed => {
                    info!(peer = %self.peer, responses = served, "Closing connection");
                    break;
                }
            }
        }

        served
    }

    async fn on_parse_failure(&self, failure: ParseFailure) -> ConnectionState {
        let ParseFailure { error, bytes_read } = failure;

        match error {
            ParseError::UnexpectedEof if bytes_read == 0 => {
                debug!(peer = %self.peer, "Connection closed by peer");
                ConnectionState::Closed
            }
            ParseError::Timeout if bytes_read == 0 => {
                debug!(peer = %self.peer, "Idle connection timed out");
                ConnectionState::Closed
            }
            ParseError::Io(e) => {
                warn!(peer = %self.peer, error = %e, "Failed to read request");
                ConnectionState::Closed
            }
            error => {
                warn!(peer = %self.peer, bytes_read, error = %error, "Bad request");
                let response = build_response(&self.hosts, None, StatusCode::BadRequest).await;
                ConnectionState::Responding(response)
            }
        }
    }
}
