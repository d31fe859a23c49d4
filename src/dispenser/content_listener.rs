//! Client-facing accept loop and per-connection worker.
//!
//! ```text
//! LISTENING --accept--> spawn worker --> LISTENING
//! worker: read request -> SessionStore -> ModeController -> Cycler -> write -> close
//! ```
//!
//! Every worker owns its connection. Whatever goes wrong in a worker (bad
//! request, reset, deadline) is logged and counted there; the accept loop
//! only ever sees new connections.
use log::{debug, info, trace, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::errors::ProtocolError;
use super::protocol::{read_request, write_rejection, write_response, ContentRequest, ContentResponse};
use super::ServerState;
use crate::logutil::escape_log;

/// Pause after a failed `accept` (e.g. descriptor exhaustion) before retrying.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run_content_listener(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                trace!("Content connection from {}", peer);
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let result = handle_content_connection(stream, &state).await;
                    report_outcome(&state, peer, result);
                });
            }
            Err(e) => {
                warn!("Content accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Serve exactly one request on `stream`, then close it.
pub async fn handle_content_connection<S>(
    stream: S,
    state: &ServerState,
) -> Result<ContentResponse, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let request = match with_deadline(state.io_timeout, read_request(&mut reader, state.max_line)).await {
        Ok(request) => request,
        Err(e) => {
            if let Some(reason) = e.reject_reason() {
                let _ = with_deadline(state.io_timeout, write_rejection(&mut write_half, &reason)).await;
                let _ = write_half.shutdown().await;
            }
            return Err(e);
        }
    };

    let response = serve(state, &request);
    with_deadline(state.io_timeout, write_response(&mut write_half, &response)).await?;
    let _ = write_half.shutdown().await;
    state.metrics.inc_requests_served();
    Ok(response)
}

/// Resolve one request against the shared state: session, mode, next label, text.
pub fn serve(state: &ServerState, request: &ContentRequest) -> ContentResponse {
    let (session, created) = state.store.get_or_insert(request.token);
    if created {
        state.metrics.inc_sessions_created();
        info!(
            "New session {} ({}), {} active",
            request.token,
            escape_log(&request.name),
            state.store.len()
        );
    }

    let category = state.mode.current().category();
    let draw = session.next(category);
    if draw.cycle_completed {
        state.metrics.inc_cycles_completed();
        info!("{} CYCLE COMPLETED for session {}", category, request.token);
    }

    let text = match state.table.text(category, &draw.label) {
        Some(text) => text.to_string(),
        None => {
            warn!("No {} text for label '{}'", category, draw.label);
            String::new()
        }
    };
    debug!(
        "Served {} {} to session {} ({})",
        category,
        draw.label,
        request.token,
        escape_log(&request.name)
    );
    ContentResponse {
        label: draw.label,
        marker: state.marker.clone(),
        text,
    }
}

pub(crate) async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, ProtocolError>
where
    F: Future<Output = Result<T, ProtocolError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}

fn report_outcome(state: &ServerState, peer: SocketAddr, result: Result<ContentResponse, ProtocolError>) {
    match result {
        Ok(_) => {}
        Err(ProtocolError::Timeout) => {
            state.metrics.inc_timeouts();
            warn!("Connection from {} timed out (retryable)", peer);
        }
        Err(e) if e.is_retryable() => {
            state.metrics.inc_transport_errors();
            warn!("Transport error with {}: {} (retryable)", peer, e);
        }
        Err(e) => {
            state.metrics.inc_protocol_rejections();
            warn!("Rejected request from {}: {}", peer, e);
        }
    }
}
