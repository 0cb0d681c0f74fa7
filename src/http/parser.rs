use std::collections::HashMap;

use thiserror::Error;
use tokio::io::AsyncRead;

use crate::http::line::{LineError, LineReader};
use crate::http::request::{HTTP_1_1, METHOD_GET, Request, canonical_header_key, is_valid_header_key};

/// Reasons a request could not be read.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),

    #[error("header missing colon: {0:?}")]
    MalformedHeader(String),

    #[error("invalid header: {0:?}")]
    InvalidHeader(String),

    #[error("unsupported protocol version: {0:?}")]
    UnsupportedVersion(String),

    #[error("unsupported method: {0:?}")]
    UnsupportedMethod(String),

    #[error("invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("missing Host header")]
    MissingHost,

    #[error("timed out waiting for request data")]
    Timeout,

    #[error("connection closed mid-request")]
    UnexpectedEof,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A parse error together with how much of the stream it had consumed.
///
/// `bytes_read == 0` on a timeout or EOF means the peer sent nothing new,
/// which the connection treats as an idle close rather than a bad request.
#[derive(Debug, Error)]
#[error("{error} (after {bytes_read} bytes)")]
pub struct ParseFailure {
    #[source]
    pub error: ParseError,
    pub bytes_read: usize,
}

struct Progress {
    bytes_read: usize,
}

impl Progress {
    fn fail(&self, error: ParseError) -> ParseFailure {
        ParseFailure {
            error,
            bytes_read: self.bytes_read,
        }
    }

    fn line_failed(&mut self, err: LineError) -> ParseFailure {
        self.bytes_read += err.partial_len();
        let error = match err {
            LineError::Timeout { .. } => ParseError::Timeout,
            LineError::UnexpectedEof { .. } => ParseError::UnexpectedEof,
            LineError::Io(e) => ParseError::Io(e),
        };
        self.fail(error)
    }
}

/// Reads and validates exactly one request from `reader`.
pub async fn read_request<S>(reader: &mut LineReader<S>) -> Result<Request, ParseFailure>
where
    S: AsyncRead + Unpin,
{
    let mut progress = Progress { bytes_read: 0 };

    let line = reader.read_line().await.map_err(|e| progress.line_failed(e))?;
    progress.bytes_read += line.consumed;

    let (method, url, proto) =
        parse_request_line(&line.text).map_err(|e| progress.fail(e))?;

    let mut headers = HashMap::new();
    let mut host = String::new();
    let mut close = false;

    loop {
        let line = reader.read_line().await.map_err(|e| progress.line_failed(e))?;
        progress.bytes_read += line.consumed;

        if line.text.is_empty() {
            break;
        }

        let (key, value) = parse_header_line(&line.text).map_err(|e| progress.fail(e))?;
        match key.as_str() {
            "Host" => host = value.clone(),
            "Connection" => close = value == "close",
            _ => {}
        }
        headers.insert(key, value);
    }

    let mut request = Request {
        method,
        url,
        proto,
        headers,
        host,
        close,
    };
    validate(&mut request).map_err(|e| progress.fail(e))?;

    Ok(request)
}

/// Splits a request line into method, URL and protocol.
pub fn parse_request_line(line: &str) -> Result<(String, String, String), ParseError> {
    let parts: Vec<&str> = line.split(' ').collect();
    match parts.as_slice() {
        [method, url, proto] => Ok((method.to_string(), url.to_string(), proto.to_string())),
        _ => Err(ParseError::MalformedStartLine(line.to_string())),
    }
}

/// Splits a header line into its canonical key and its value.
///
/// Whitespace before the value is dropped; whitespace before the key is not
/// tolerated.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedHeader(line.to_string()))?;

    let value = value.trim_start();
    if !is_valid_header_key(key) || value.contains("\r\n") {
        return Err(ParseError::InvalidHeader(line.to_string()));
    }

    Ok((canonical_header_key(key), value.to_string()))
}

fn validate(request: &mut Request) -> Result<(), ParseError> {
    if request.proto != HTTP_1_1 {
        return Err(ParseError::UnsupportedVersion(request.proto.clone()));
    }

    if request.method != METHOD_GET {
        return Err(ParseError::UnsupportedMethod(request.method.clone()));
    }

    if !request.url.starts_with('/') {
        return Err(ParseError::InvalidUrl(request.url.clone()));
    }

    if request.url.ends_with('/') {
        request.url.push_str("index.html");
    }

    if request.host.is_empty() {
        return Err(ParseError::MissingHost);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let mut reader = LineReader::new(&req[..]);

        let parsed = read_request(&mut reader).await.unwrap();

        assert_eq!(parsed.url, "/index.html");
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    }

    #[test]
    fn start_line_rejects_fourth_token() {
        let result = parse_request_line("GET / HTTP/1.1 extra");
        assert!(matches!(result, Err(ParseError::MalformedStartLine(_))));
    }
}
