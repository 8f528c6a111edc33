//! Loopback HTTP listener and per-connection request handling.

use crate::{
    context::BridgeContext,
    error::BridgeError,
    request::{parse_request_line, read_request_head},
    router, Result, AUTHOR, EXTENSION_NAME, VERSION,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Pause after a failed accept before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Loopback HTTP listener serving the history API.
///
/// Each accepted connection runs on its own task; a slow or broken client only ties up
/// its own task.
pub struct BridgeServer {
    context: BridgeContext,
    listener: TcpListener,
}

impl BridgeServer {
    /// Bind the configured loopback address. A bind failure is fatal for the service.
    pub async fn bind(context: BridgeContext) -> Result<Self> {
        let addr = context.config().socket_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to start server on {}: {}", addr, e);
            BridgeError::Bind {
                addr: addr.to_string(),
                source: e,
            }
        })?;
        info!("HTTP Server started on {}", listener.local_addr()?);
        Ok(Self { context, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn context(&self) -> &BridgeContext {
        &self.context
    }

    /// Log the startup banner with the endpoint list.
    pub fn log_banner(&self) {
        let addr = self
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!("{} v{}", EXTENSION_NAME, VERSION);
        info!("Author: {}", AUTHOR);
        info!("API running on http://{}", addr);
        info!("Available Endpoints:");
        info!("    GET  /health      - Health check");
        info!("    GET  /history     - Get all proxy history");
        info!("    GET  /history/N   - Get specific request by index");
        info!("    GET  /stats       - Get traffic statistics");
    }

    /// Accept connections until the context's shutdown signal fires.
    pub async fn run(self) -> Result<()> {
        let shutdown = self.context.shutdown().clone();

        loop {
            let notified = shutdown.notify().notified();
            tokio::pin!(notified);
            // Register for the wake-up before checking the flag so a trigger between
            // the check and the accept is not lost.
            notified.as_mut().enable();
            if !shutdown.is_running() {
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let context = self.context.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &context).await {
                                warn!(%peer, "Request handler error: {}", e);
                            }
                        });
                    }
                    Err(e) => accept_failed(&e).await,
                },
                _ = &mut notified => {}
            }
        }

        info!("HTTP Server stopped accepting connections");
        Ok(())
    }
}

// Errors such as EMFILE tend to persist; the pause keeps the loop from spinning on them.
async fn accept_failed(e: &std::io::Error) {
    error!("Server error: {}", e);
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Serve exactly one request on `stream`, then close it.
///
/// Malformed requests are answered with silence: the error is returned for logging and
/// the stream is dropped.
pub async fn handle_connection<S>(mut stream: S, context: &BridgeContext) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let head = read_request_head(&mut stream, context.config().max_header_bytes).await?;
    let line = parse_request_line(&head)?;
    debug!(method = %line.method, path = %line.path, "handling request");

    let response = router::route(&line.method, &line.path, context.history())?;
    response.write_to(&mut stream).await?;

    if let Err(e) = stream.shutdown().await {
        debug!("shutdown after response failed: {}", e);
    }
    Ok(())
}
