//! vhttpd - Virtual-hosting static file server
//!
//! Core library for HTTP handling, virtual host resolution and the server
//! loop.

pub mod config;
pub mod http;
pub mod server;
pub mod vhost;
