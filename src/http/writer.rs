use std::path::PathBuf;

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Serializes the status line, headers and blank separator line.
///
/// Headers come out in ascending order of name.
pub fn serialize_head(resp: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.proto,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.put_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    head: BytesMut,
    body: Option<PathBuf>,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            head: serialize_head(response),
            body: response.file_path.clone(),
        }
    }

    /// Writes the head, then streams the body file if there is one.
    ///
    /// The body file is opened before anything is written, so a file that
    /// vanished since it was stat'ed leaves the stream untouched.
    /// Returns the number of body bytes sent.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut file = match &self.body {
            Some(path) => Some(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open {}", path.display()))?,
            ),
            None => None,
        };

        stream
            .write_all(&self.head)
            .await
            .context("failed to write response head")?;

        let mut sent = 0;
        if let Some(file) = &mut file {
            sent = tokio::io::copy(file, stream)
                .await
                .context("failed to write response body")?;
        }

        stream.flush().await?;
        Ok(sent)
    }
}
