//! # Dispenser Module
//!
//! The server side of the jokeserver: shared session/mode state and the two
//! TCP listeners that operate on it.
//!
//! ## Components
//!
//! - [`server`] - [`JokeServer`] binds both listeners for one instance and runs them
//! - [`content_listener`] - accept loop + one worker per client request
//! - [`admin_listener`] - accept loop where every connection toggles the mode
//! - [`session`] - [`SessionStore`](session::SessionStore) keyed by client token
//! - [`mode`] - [`ModeController`](mode::ModeController), the process-wide joke/proverb flag
//! - [`protocol`] - line-oriented request/response wire format
//! - [`errors`] - per-connection error taxonomy
//!
//! ## Architecture
//!
//! ```text
//!  content port                         admin port
//! ┌──────────────────┐                ┌──────────────────┐
//! │ content listener │                │ admin listener   │
//! └──────────────────┘                └──────────────────┘
//!      │ worker per conn                   │ worker per conn
//!      ▼                                   ▼
//! ┌──────────────┐  ┌────────────────┐     │
//! │ SessionStore │  │ ModeController │ ◄───┘ toggle()
//! └──────────────┘  └────────────────┘
//!      │ per-session lock   ▲ current()
//!      ▼                    │
//!   Cyclers ────────────────┘
//! ```
//!
//! All shared state lives in one [`ServerState`] handed to the listeners at
//! construction; there are no statics.

pub mod admin_listener;
pub mod content_listener;
pub mod errors;
pub mod mode;
pub mod protocol;
pub mod server;
pub mod session;

pub use server::{BoundServer, JokeServer};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::content::ContentTable;
use crate::metrics::ServerMetrics;
use mode::{Mode, ModeController};
use session::SessionStore;

/// State shared by every worker of one server instance.
#[derive(Debug)]
pub struct ServerState {
    pub table: Arc<ContentTable>,
    pub store: SessionStore,
    pub mode: Arc<ModeController>,
    pub metrics: Arc<ServerMetrics>,
    /// Label prefix for responses of this instance, if any.
    pub marker: Option<String>,
    pub io_timeout: Duration,
    pub max_line: usize,
}

impl ServerState {
    pub fn from_config(config: &Config, marker: Option<String>) -> Result<Self> {
        let table = Arc::new(config.content_table()?);
        Ok(ServerState {
            store: SessionStore::new(Arc::clone(&table)),
            table,
            mode: Arc::new(ModeController::new(Mode::Joke)),
            metrics: Arc::new(ServerMetrics::new()),
            marker,
            io_timeout: config.server.io_timeout(),
            max_line: config.server.max_line_bytes,
        })
    }
}
