//! Serving a [`SearchServer`] over a byte stream pair, usually stdin/stdout.

use anyhow::Context;
use rmcp::ServiceExt;
use rmcp::model::ClientJsonRpcMessage;
use rmcp::service::QuitReason;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;

use crate::server::SearchServer;

const INBOUND_BUFFER: usize = 64 * 1024;

impl SearchServer {
    /// Serve on the process's stdin/stdout until EOF or `cancel`.
    pub async fn serve_stdio(self, cancel: CancellationToken) -> anyhow::Result<QuitReason> {
        let (stdin, stdout) = rmcp::transport::stdio();
        self.serve_io(stdin, stdout, cancel).await
    }

    /// Serve newline-delimited JSON-RPC read from `reader`, replies to `writer`.
    ///
    /// Returns once the peer closes its side or `cancel` fires; a cancel
    /// during the initialize handshake returns immediately.
    pub async fn serve_io<R, W>(
        self,
        reader: R,
        writer: W,
        cancel: CancellationToken,
    ) -> anyhow::Result<QuitReason>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let inbound = skip_unparsable_lines(reader);
        let running = tokio::select! {
            running = self.serve_with_ct((inbound, writer), cancel.child_token()) => {
                running.context("MCP initialize handshake failed")?
            }
            () = cancel.cancelled() => {
                tracing::info!(target: "mcp.server", "mcp.session.cancelled_before_init");
                return Ok(QuitReason::Cancelled);
            }
        };
        tracing::info!(target: "mcp.server", "mcp.session.start");

        let reason = running.waiting().await.context("MCP service task failed")?;
        tracing::info!(target: "mcp.server", ?reason, "mcp.session.end");
        Ok(reason)
    }
}

/// Forward only lines that decode as client messages.
///
/// rmcp ends the session on the first undecodable line; dropping such lines
/// here keeps one bad write from a client from tearing the session down.
fn skip_unparsable_lines<R>(reader: R) -> DuplexStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (inbound, mut sink) = tokio::io::duplex(INBOUND_BUFFER);
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "mcp.transport", error = %err, "mcp.read.error");
                    break;
                }
            }
            let body = line.trim_ascii();
            if body.is_empty() {
                continue;
            }
            if let Err(err) = serde_json::from_slice::<ClientJsonRpcMessage>(body) {
                tracing::warn!(
                    target: "mcp.transport",
                    error = %err,
                    bytes = body.len(),
                    "mcp.line.unparsable"
                );
                continue;
            }
            if sink.write_all(body).await.is_err() || sink.write_all(b"\n").await.is_err() {
                break;
            }
        }
        let _ = sink.shutdown().await;
    });
    inbound
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn bad_lines_are_dropped_and_good_ones_forwarded() {
        let input = concat!(
            "not json\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "{\"unterminated\": \n",
            "  {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}  \n",
        );
        let mut out = skip_unparsable_lines(input.as_bytes());
        let mut forwarded = String::new();
        out.read_to_string(&mut forwarded).await.unwrap();
        assert_eq!(
            forwarded,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\
             {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n"
        );
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_dropped() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}");
        let mut out = skip_unparsable_lines(std::io::Cursor::new(input));
        let mut forwarded = String::new();
        out.read_to_string(&mut forwarded).await.unwrap();
        assert_eq!(forwarded, "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
    }
}
