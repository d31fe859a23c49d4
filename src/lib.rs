//! # Jokeserver - concurrent joke and proverb server
//!
//! Clients connect over TCP, identify themselves with a session token and
//! receive one item from the currently active content set (jokes or
//! proverbs). A separate admin port flips which set is served, for every
//! client at once.
//!
//! ## Features
//!
//! - **Fair rotation**: each session walks a fresh uniform shuffle of a content
//!   set and sees every item once before any repeat
//! - **Shared mode**: one atomic joke/proverb flag per server instance, toggled
//!   by connecting to the admin port
//! - **Concurrent workers**: one Tokio task per connection; a stalled or
//!   misbehaving client only ever affects its own connection
//! - **Primary/secondary pair**: a second instance on its own ports tags its
//!   responses with `<S2>`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jokeserver::config::{Config, InstanceRole};
//! use jokeserver::dispenser::JokeServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = JokeServer::new(config, InstanceRole::Primary)?;
//!     server.bind().await?.run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`dispenser`] - listeners, session store, mode controller, wire protocol
//! - [`content`] - content table and per-session cyclers
//! - [`config`] - TOML configuration with reference-deployment defaults
//! - [`client`] - one-shot content and admin requests
//! - [`metrics`] - per-instance counters
//! - [`logutil`] - log sanitizing for client-supplied strings

pub mod client;
pub mod config;
pub mod content;
pub mod dispenser;
pub mod logutil;
pub mod metrics;
