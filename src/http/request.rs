use std::collections::HashMap;

/// The only method the server answers.
pub const METHOD_GET: &str = "GET";

/// The only protocol version the server speaks.
pub const HTTP_1_1: &str = "HTTP/1.1";

/// Represents a parsed and validated HTTP request.
///
/// Produced by [`read_request`](crate::http::parser::read_request); once
/// returned it is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method, always `GET` for a validated request
    pub method: String,
    /// The request URL, always starting with `/`
    pub url: String,
    /// Protocol version, always `HTTP/1.1` for a validated request
    pub proto: String,
    /// Request headers keyed by canonical header name
    pub headers: HashMap<String, String>,
    /// Value of the `Host` header
    pub host: String,
    /// Whether the client sent `Connection: close`
    pub close: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: String,
    url: Option<String>,
    proto: String,
    headers: HashMap<String, String>,
    host: Option<String>,
    close: bool,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: METHOD_GET.to_string(),
            url: None,
            proto: HTTP_1_1.to_string(),
            headers: HashMap::new(),
            host: None,
            close: false,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn proto(mut self, proto: impl Into<String>) -> Self {
        self.proto = proto.into();
        self
    }

    /// Adds a header under its canonical name. `Host` and `Connection`
    /// also populate the dedicated fields.
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        let key = canonical_header_key(key);
        let value = value.into();
        match key.as_str() {
            "Host" => self.host = Some(value.clone()),
            "Connection" => self.close = value == "close",
            _ => {}
        }
        self.headers.insert(key, value);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method,
            url: self.url.ok_or("url missing")?,
            proto: self.proto,
            headers: self.headers,
            host: self.host.ok_or("host missing")?,
            close: self.close,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, case-insensitively.
    ///
    /// # Example
    ///
    /// ```
    /// # use vhttpd::http::request::RequestBuilder;
    /// let req = RequestBuilder::new()
    ///     .url("/")
    ///     .header("host", "example.com")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(req.header("HOST"), Some("example.com"));
    /// ```
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_key(key))
            .map(|v| v.as_str())
    }

    /// Whether the connection should stay open after the response.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}

/// Whether `key` is a legal header name: non-empty, ASCII letters, digits
/// and hyphens only.
pub fn is_valid_header_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Returns the canonical form of a header name.
///
/// The first letter and any letter following a hyphen are upper-cased, the
/// rest lower-cased: `content-type` becomes `Content-Type`. Names that are
/// not valid header keys are returned unchanged.
pub fn canonical_header_key(key: &str) -> String {
    if !is_valid_header_key(key) {
        return key.to_string();
    }

    let mut upper = true;
    key.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}
