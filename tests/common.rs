#![allow(dead_code)]

//! Test utilities: spin up a server instance on ephemeral ports.

use jokeserver::config::{Config, InstanceRole};
use jokeserver::dispenser::{JokeServer, ServerState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub content: SocketAddr,
    pub admin: SocketAddr,
    pub state: Arc<ServerState>,
}

/// Default configuration with both instances moved to port 0 and no log file.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.logging.file = None;
    for inst in [&mut config.server.primary, &mut config.server.secondary] {
        inst.content_port = 0;
        inst.admin_port = 0;
    }
    config
}

#[allow(dead_code)] // not every test binary needs a custom config
pub async fn spawn_with(config: Config, role: InstanceRole) -> TestServer {
    let bound = JokeServer::new(config, role)
        .expect("server config")
        .bind()
        .await
        .expect("bind");
    let server = TestServer {
        content: bound.content_addr().expect("content addr"),
        admin: bound.admin_addr().expect("admin addr"),
        state: bound.state(),
    };
    bound.spawn();
    server
}

#[allow(dead_code)]
pub async fn spawn_server(role: InstanceRole) -> TestServer {
    spawn_with(test_config(), role).await
}

/// Poll `cond` until it holds or a couple of seconds pass. Workers update
/// metrics after closing the socket, so tests wait for counters.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
