use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::http::mime::content_type_for;
use crate::http::request::{HTTP_1_1, Request};
use crate::vhost::VirtualHosts;

/// HTTP status codes the server produces.
///
/// - `Ok` (200): the file is served
/// - `BadRequest` (400): the request could not be parsed or validated
/// - `NotFound` (404): no file for the resolved path, or the path escaped
///   its document root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use vhttpd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Looks up a status code by number.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            400 => Some(StatusCode::BadRequest),
            404 => Some(StatusCode::NotFound),
            _ => None,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use vhttpd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// The body, if any, is not held in memory: `file_path` names the file that
/// the writer streams after the headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Protocol for the status line
    pub proto: &'static str,
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers, kept sorted by name for serialization
    pub headers: BTreeMap<String, String>,
    /// File to send as the body; `None` means no body
    pub file_path: Option<PathBuf>,
    /// Whether the connection is torn down after this response
    pub close: bool,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .file("/srv/www/hello.txt")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    file_path: Option<PathBuf>,
    close: bool,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            file_path: None,
            close: false,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the file streamed as the body.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Marks the response as the last one on its connection.
    ///
    /// Adds the `Connection: close` header.
    pub fn close(mut self, close: bool) -> Self {
        if close {
            self.headers
                .insert("Connection".to_string(), "close".to_string());
        }
        self.close = close;
        self
    }

    /// Builds the final Response.
    ///
    /// Stamps the `Date` header with the current time if not already present.
    pub fn build(mut self) -> Response {
        if let Some(date) = format_http_time(SystemTime::now()) {
            self.headers.entry("Date".to_string()).or_insert(date);
        }

        Response {
            proto: HTTP_1_1,
            status: self.status,
            headers: self.headers,
            file_path: self.file_path,
            close: self.close,
        }
    }
}

impl Response {
    /// A 400 response. Always closes the connection.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest).close(true).build()
    }

    /// A 404 response with no body.
    pub fn not_found(close: bool) -> Self {
        ResponseBuilder::new(StatusCode::NotFound).close(close).build()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    pub fn has_body(&self) -> bool {
        self.file_path.is_some()
    }
}

/// Builds the response for `request` with the intended `status`.
///
/// Only a 200 consults the filesystem: the request's host is resolved, the
/// URL is mapped into the document root, and the file is stat'ed. Unknown
/// hosts, paths escaping the root, and missing or non-regular files are
/// downgraded to 404. A 400 always closes the connection; other responses
/// close it when the request asked to.
pub async fn build_response(
    hosts: &VirtualHosts,
    request: Option<&Request>,
    status: StatusCode,
) -> Response {
    let close = status == StatusCode::BadRequest || request.is_some_and(|r| r.close);

    let request = match (status, request) {
        (StatusCode::Ok, Some(request)) => request,
        (StatusCode::Ok, None) => return Response::bad_request(),
        (status, _) => return ResponseBuilder::new(status).close(close).build(),
    };

    let path = match hosts.candidate_path(&request.host, &request.url) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(host = %request.host, url = %request.url, error = %e, "Cannot resolve request path");
            return Response::not_found(close);
        }
    };

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => {
            tracing::debug!(path = %path.display(), "Requested path is not a regular file");
            return Response::not_found(close);
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Cannot stat requested file");
            return Response::not_found(close);
        }
    };

    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", meta.len().to_string())
        .header("Content-Type", content_type_for(&path));

    if let Some(modified) = meta.modified().ok().and_then(format_http_time) {
        builder = builder.header("Last-Modified", modified);
    } else {
        tracing::debug!(path = %path.display(), "Omitting Last-Modified: mtime outside HTTP date range");
    }

    builder.file(path).close(close).build()
}

/// Last instant an IMF-fixdate can express: 9999-12-31 23:59:59 GMT.
const MAX_HTTP_DATE_SECS: u64 = 253_402_300_799;

/// Formats a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
///
/// Returns `None` for times before 1970 or after year 9999.
pub fn format_http_time(time: SystemTime) -> Option<String> {
    let since_epoch = time.duration_since(UNIX_EPOCH).ok()?;
    if since_epoch > Duration::from_secs(MAX_HTTP_DATE_SECS) {
        return None;
    }
    Some(httpdate::fmt_http_date(time))
}
