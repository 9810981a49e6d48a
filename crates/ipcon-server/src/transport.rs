//! Server transports
//!
//! Implements newline-delimited JSON-RPC over STDIO.

use crate::{IpconServer, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// STDIO transport for the server
///
/// Reads one JSON-RPC request per line from stdin and writes one response
/// per line to stdout.
pub struct StdioTransport {
    server: Arc<IpconServer>,
}

impl StdioTransport {
    /// Create new STDIO transport
    pub fn new(server: Arc<IpconServer>) -> Self {
        Self { server }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run_async(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Run the STDIO transport on a fresh runtime (blocking)
    pub fn run_blocking(&self) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.run_async())
    }

    /// Serve requests from any line reader to any writer until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        let mut handled = 0usize;

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;

            // EOF
            if n == 0 {
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            let response = self.server.handle_request(&line).await?;
            handled += 1;

            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!(requests = handled, "transport closed");
        Ok(())
    }
}
