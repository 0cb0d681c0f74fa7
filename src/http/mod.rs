//! HTTP protocol implementation.
//!
//! This module implements the subset of HTTP/1.1 the server speaks: `GET`
//! requests for static files over persistent connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`line`**: CRLF line reading with a per-read inactivity timeout
//! - **`parser`**: Builds and validates a request from successive lines
//! - **`request`**: HTTP request representation and header name canonicalization
//! - **`response`**: HTTP response representation, status table, and file resolution
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`connection`**: The per-connection request-response state machine
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the next request, 5s per read
//!        └──────┬──────┘
//!               │ Request parsed, or bad request / partial timeout (400)
//!               │ (EOF or idle timeout with nothing received → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Send status, headers, file body
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close (Connection: close, or 400) → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vhttpd::http::connection::Connection;
//! use vhttpd::vhost::VirtualHosts;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut hosts = VirtualHosts::new();
//!     hosts.insert("localhost", "/srv/www");
//!     let hosts = Arc::new(hosts);
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let hosts = hosts.clone();
//!         tokio::spawn(async move {
//!             Connection::new(socket, hosts, addr.to_string()).run().await;
//!         });
//!     }
//! }
//! ```

pub mod line;
pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
