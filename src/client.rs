//! Thin client helpers for the content and admin ports.
//!
//! These mirror what the interactive client and admin consoles send on the
//! wire; the consoles themselves (prompting, server switching) are not part
//! of this crate. The CLI `fetch` and `toggle` commands and the integration
//! tests drive servers through these functions.
use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;

use crate::dispenser::protocol::{split_marker, ERROR_PREFIX};
use crate::dispenser::session::SessionToken;

/// One item as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub label: String,
    /// Marker the server put in front of the label (`<S2>` for the secondary).
    pub marker: Option<String>,
    pub text: String,
}

impl Delivery {
    pub fn is_secondary(&self) -> bool {
        self.marker.is_some()
    }
}

/// Draw a client token the way the reference client does: a random
/// non-negative 31-bit integer. Uniqueness is not guaranteed.
pub fn random_token() -> SessionToken {
    SessionToken(rand::thread_rng().gen_range(0..i32::MAX as i64))
}

/// Send one content request and read the two-line response.
pub async fn fetch_item<A>(addr: A, token: SessionToken, name: &str, limit: Duration) -> Result<Delivery>
where
    A: ToSocketAddrs,
{
    timeout(limit, fetch_inner(addr, token, name))
        .await
        .map_err(|_| anyhow!("Timed out waiting for content server"))?
}

async fn fetch_inner<A: ToSocketAddrs>(addr: A, token: SessionToken, name: &str) -> Result<Delivery> {
    let stream = TcpStream::connect(addr)
        .await
        .context("Failed to connect to content server")?;
    let (read_half, mut write_half) = stream.into_split();
    write_half
        .write_all(format!("{}\n{}\n", token, name).as_bytes())
        .await?;
    write_half.flush().await?;

    let mut lines = BufReader::new(read_half).lines();
    let label_line = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("Server closed the connection without a response"))?;
    if let Some(reason) = label_line.strip_prefix(ERROR_PREFIX) {
        bail!("Server rejected request:{}", reason);
    }
    let text = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("Server response is missing the text line"))?;

    let (marker, label) = split_marker(&label_line);
    Ok(Delivery {
        label: label.to_string(),
        marker: marker.map(str::to_string),
        text,
    })
}

/// Open and close an admin connection, waiting until the server has closed
/// its side (which happens after the toggle is applied).
pub async fn toggle_mode<A>(addr: A, limit: Duration) -> Result<()>
where
    A: ToSocketAddrs,
{
    timeout(limit, async {
        let mut stream = TcpStream::connect(addr)
            .await
            .context("Failed to connect to admin port")?;
        let mut sink = Vec::new();
        stream.read_to_end(&mut sink).await?;
        Ok::<(), anyhow::Error>(())
    })
    .await
    .map_err(|_| anyhow!("Timed out waiting for admin port"))?
}
