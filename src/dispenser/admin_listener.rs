//! Admin-facing accept loop. A connection carries no payload: being accepted
//! is the command, and each accepted connection flips the mode exactly once.
use log::{info, trace, warn};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use super::content_listener::ACCEPT_BACKOFF;
use super::mode::{Mode, ModeController};
use crate::metrics::ServerMetrics;

pub async fn run_admin_listener(
    listener: TcpListener,
    mode: Arc<ModeController>,
    metrics: Arc<ServerMetrics>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                trace!("Admin connection from {}", peer);
                let mode = Arc::clone(&mode);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    handle_admin_connection(stream, &mode, &metrics).await;
                });
            }
            Err(e) => {
                warn!("Admin accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Toggle the mode, then close the connection. The close tells the admin
/// client the toggle has been applied.
pub async fn handle_admin_connection<S>(mut stream: S, mode: &ModeController, metrics: &ServerMetrics) -> Mode
where
    S: AsyncWrite + Unpin,
{
    let now = mode.toggle();
    metrics.inc_mode_toggles();
    info!("Mode toggled to {}", now);
    let _ = stream.shutdown().await;
    now
}
