use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::line::DEFAULT_READ_TIMEOUT;
use crate::vhost::VirtualHosts;

/// Serves static files for a fixed set of virtual hosts.
#[derive(Debug, Clone)]
pub struct Server {
    hosts: Arc<VirtualHosts>,
    read_timeout: Duration,
}

impl Server {
    pub fn new(hosts: VirtualHosts) -> Self {
        Self {
            hosts: Arc::new(hosts),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Overrides the per-read inactivity timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Verifies the docroots, binds `addr` and serves until the listener fails.
    pub async fn run(&self, addr: &str) -> anyhow::Result<()> {
        self.hosts.verify()?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Listening on {}", listener.local_addr()?);

        self.serve(listener).await
    }

    /// Accepts connections on `listener`, one task per connection.
    ///
    /// Only returns when accepting fails.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (socket, peer) = listener
                .accept()
                .await
                .context("Failed to accept connection")?;
            info!("Accepted connection from {}", peer);

            let hosts = Arc::clone(&self.hosts);
            let read_timeout = self.read_timeout;
            tokio::spawn(async move {
                let mut conn = Connection::with_read_timeout(socket, hosts, peer.to_string(), read_timeout);
                conn.run().await;
            });
        }
    }
}
