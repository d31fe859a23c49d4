//! # Configuration Management Module
//!
//! Loads and validates the jokeserver configuration. Every section carries
//! serde defaults matching the reference deployment, so an empty file (or a
//! file with only a few overrides) is a valid configuration.
//!
//! ## Configuration Structure
//!
//! - [`ServerConfig`] - bind address, per-connection deadline, line limits and
//!   the port pair of each instance ([`InstanceConfig`])
//! - [`ContentConfig`] - the joke and proverb tables served to clients
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jokeserver::config::{Config, InstanceRole};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let ports = config.server.instance(InstanceRole::Primary);
//!     println!("content port {}, admin port {}", ports.content_port, ports.admin_port);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1"
//! io_timeout_secs = 10
//!
//! [server.secondary]
//! content_port = 4546
//! admin_port = 5051
//! marker = "<S2>"
//!
//! [content.jokes]
//! JA = "Why did the picture go to jail? Because it was framed."
//! ```
//!
//! Ports are configuration, not protocol: any instance may move them as long
//! as its content and admin ports differ.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::fs;

use crate::content::ContentTable;

/// Which of the two server instances a process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceRole {
    #[default]
    Primary,
    Secondary,
}

impl fmt::Display for InstanceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceRole::Primary => f.write_str("primary"),
            InstanceRole::Secondary => f.write_str("secondary"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Deadline (seconds) for each read and write on a client connection.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    /// Longest request line accepted, in bytes, including the line terminator.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Interval (seconds) for periodic stats logging (0 disables).
    #[serde(default)]
    pub stats_interval_secs: u64,
    #[serde(default = "InstanceConfig::primary")]
    pub primary: InstanceConfig,
    #[serde(default = "InstanceConfig::secondary")]
    pub secondary: InstanceConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_io_timeout_secs() -> u64 {
    10
}

fn default_max_line_bytes() -> usize {
    1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            io_timeout_secs: default_io_timeout_secs(),
            max_line_bytes: default_max_line_bytes(),
            stats_interval_secs: 0,
            primary: InstanceConfig::primary(),
            secondary: InstanceConfig::secondary(),
        }
    }
}

impl ServerConfig {
    pub fn instance(&self, role: InstanceRole) -> &InstanceConfig {
        match role {
            InstanceRole::Primary => &self.primary,
            InstanceRole::Secondary => &self.secondary,
        }
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

/// Ports and response tagging for one server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub content_port: u16,
    pub admin_port: u16,
    /// Prefix added to the label line of every response. Only the secondary
    /// instance carries one by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl InstanceConfig {
    pub fn primary() -> Self {
        Self {
            content_port: 4545,
            admin_port: 5050,
            marker: None,
        }
    }

    pub fn secondary() -> Self {
        Self {
            content_port: 4546,
            admin_port: 5051,
            marker: Some("<S2>".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_jokes")]
    pub jokes: BTreeMap<String, String>,
    #[serde(default = "default_proverbs")]
    pub proverbs: BTreeMap<String, String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            jokes: default_jokes(),
            proverbs: default_proverbs(),
        }
    }
}

fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(label, text)| (label.to_string(), text.to_string()))
        .collect()
}

fn default_jokes() -> BTreeMap<String, String> {
    table(&[
        ("JA", "What happens to a frog's car when it breaks down? It gets toad away."),
        ("JB", "Why did the picture go to jail? Because it was framed."),
        ("JC", "What did the tie say to the hat? You go on ahead and I'll hang around!"),
        ("JD", "Why do birds fly south for the winter? It's easier than walking!"),
    ])
}

fn default_proverbs() -> BTreeMap<String, String> {
    table(&[
        ("PA", "Comparison is the thief of joy."),
        ("PB", "The best way out is always through."),
        ("PC", "Better to light a candle than to curse the darkness."),
        ("PD", "Fortune favors the brave."),
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults
    /// (console logging only).
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Config {
                logging: LoggingConfig::default(),
                ..Config::default()
            })
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Check port assignments and content, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        for role in [InstanceRole::Primary, InstanceRole::Secondary] {
            let inst = self.server.instance(role);
            if inst.content_port != 0 && inst.content_port == inst.admin_port {
                bail!(
                    "{} instance uses port {} for both content and admin",
                    role,
                    inst.content_port
                );
            }
            if let Some(marker) = &inst.marker {
                if marker.contains(['\n', '\r']) {
                    bail!("{} instance marker contains a line break", role);
                }
            }
        }
        if self.server.io_timeout_secs == 0 {
            bail!("server.io_timeout_secs must be at least 1");
        }
        if self.server.max_line_bytes < 16 {
            bail!("server.max_line_bytes must be at least 16");
        }
        self.content_table()?;
        Ok(())
    }

    /// Build the immutable content table handed to the listeners.
    pub fn content_table(&self) -> Result<ContentTable> {
        ContentTable::new(self.content.jokes.clone(), self.content.proverbs.clone())
            .map_err(|e| anyhow!("Invalid content configuration: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            content: ContentConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("jokeserver.log".to_string()),
            },
        }
    }
}
