use anyhow::{anyhow, Result};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::admin_listener::run_admin_listener;
use super::content_listener::run_content_listener;
use super::ServerState;
use crate::config::{Config, InstanceRole};

/// # Joke Server
///
/// One server instance: a content listener and an admin listener sharing a
/// single [`ServerState`]. A primary and a secondary instance may run side by
/// side (normally as separate processes); each has its own ports, sessions
/// and mode, and only the secondary tags its responses.
///
/// ## Usage
///
/// ```rust,no_run
/// use jokeserver::config::{Config, InstanceRole};
/// use jokeserver::dispenser::JokeServer;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load("config.toml").await?;
///     let server = JokeServer::new(config, InstanceRole::Primary)?;
///     server.bind().await?.run().await
/// }
/// ```
pub struct JokeServer {
    config: Config,
    role: InstanceRole,
    state: Arc<ServerState>,
}

impl JokeServer {
    pub fn new(config: Config, role: InstanceRole) -> Result<Self> {
        config.validate()?;
        let marker = config.server.instance(role).marker.clone();
        let state = Arc::new(ServerState::from_config(&config, marker)?);
        Ok(JokeServer { config, role, state })
    }

    pub fn role(&self) -> InstanceRole {
        self.role
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Bind the content and admin ports of this instance.
    pub async fn bind(self) -> Result<BoundServer> {
        let host = &self.config.server.bind_address;
        let ports = self.config.server.instance(self.role);

        let content = TcpListener::bind((host.as_str(), ports.content_port))
            .await
            .map_err(|e| anyhow!("Failed to bind content port {}:{}: {}", host, ports.content_port, e))?;
        let admin = TcpListener::bind((host.as_str(), ports.admin_port))
            .await
            .map_err(|e| anyhow!("Failed to bind admin port {}:{}: {}", host, ports.admin_port, e))?;

        Ok(BoundServer {
            role: self.role,
            content,
            admin,
            state: self.state,
            stats_interval: self.config.server.stats_interval(),
        })
    }
}

/// A server instance whose listeners are bound but not yet accepting.
pub struct BoundServer {
    role: InstanceRole,
    content: TcpListener,
    admin: TcpListener,
    state: Arc<ServerState>,
    stats_interval: Option<Duration>,
}

impl BoundServer {
    pub fn content_addr(&self) -> Result<SocketAddr> {
        Ok(self.content.local_addr()?)
    }

    pub fn admin_addr(&self) -> Result<SocketAddr> {
        Ok(self.admin.local_addr()?)
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Run both accept loops until the process is terminated.
    pub async fn run(self) -> Result<()> {
        info!(
            "Server {} content on {}, admin on {}",
            self.role,
            self.content_addr()?,
            self.admin_addr()?
        );

        if let Some(interval) = self.stats_interval {
            tokio::spawn(log_stats(Arc::clone(&self.state), interval));
        }

        tokio::join!(
            run_content_listener(self.content, Arc::clone(&self.state)),
            run_admin_listener(
                self.admin,
                Arc::clone(&self.state.mode),
                Arc::clone(&self.state.metrics)
            ),
        );
        Ok(())
    }

    /// Run on a background task; used by tests and embedders.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}

async fn log_stats(state: Arc<ServerState>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let snapshot = state.metrics.snapshot();
        let payload = serde_json::to_string(&snapshot).unwrap_or_default();
        info!(
            "stats mode={} sessions={} {}",
            state.mode.current(),
            state.store.len(),
            payload
        );
    }
}
