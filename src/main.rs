//! Binary entrypoint for the jokeserver CLI.
//!
//! Commands:
//! - `start [--secondary]` - run a server instance (content + admin listeners)
//! - `init` - write a starter `config.toml`
//! - `fetch [--secondary] [--host <h>] [--token <n>] [--name <s>]` - request one item
//! - `toggle [--secondary] [--host <h>]` - flip the joke/proverb mode once
//!
//! See the library crate docs for module-level details: `jokeserver::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::time::Duration;

use jokeserver::client::{fetch_item, random_token, toggle_mode};
use jokeserver::config::{Config, InstanceRole};
use jokeserver::dispenser::session::SessionToken;
use jokeserver::dispenser::JokeServer;

#[derive(Parser)]
#[command(name = "jokeserver")]
#[command(about = "A concurrent joke and proverb server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a server instance
    Start {
        /// Run as the secondary instance (secondary ports, tagged responses)
        #[arg(short, long)]
        secondary: bool,
    },
    /// Write a default configuration file
    Init,
    /// Request one joke or proverb
    Fetch {
        /// Talk to the secondary instance
        #[arg(short, long)]
        secondary: bool,
        /// Server host name or address
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Session token; a random one is drawn when omitted
        #[arg(short, long)]
        token: Option<i64>,
        /// Display name sent with the request
        #[arg(short, long, default_value = "anonymous")]
        name: String,
    },
    /// Toggle the server between joke and proverb mode
    Toggle {
        /// Talk to the secondary instance
        #[arg(short, long)]
        secondary: bool,
        /// Server host name or address
        #[arg(long, default_value = "localhost")]
        host: String,
    },
}

fn role(secondary: bool) -> InstanceRole {
    if secondary {
        InstanceRole::Secondary
    } else {
        InstanceRole::Primary
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { secondary } => {
            let config = Config::load_or_default(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting jokeserver v{}", env!("CARGO_PKG_VERSION"));
            let server = JokeServer::new(config, role(secondary))?;
            server.bind().await?.run().await?;
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Fetch {
            secondary,
            host,
            token,
            name,
        } => {
            let config = Config::load_or_default(&cli.config).await?;
            init_logging(&None, cli.verbose);
            let port = config.server.instance(role(secondary)).content_port;
            let token = token.map(SessionToken).unwrap_or_else(random_token);
            let delivery = fetch_item(
                (host.as_str(), port),
                token,
                &name,
                config.server.io_timeout() + Duration::from_secs(1),
            )
            .await?;
            let label = match &delivery.marker {
                Some(marker) => format!("{} {}", marker, delivery.label),
                None => delivery.label.clone(),
            };
            println!("{} {}: {}", label, name, delivery.text);
        }
        Commands::Toggle { secondary, host } => {
            let config = Config::load_or_default(&cli.config).await?;
            init_logging(&None, cli.verbose);
            let port = config.server.instance(role(secondary)).admin_port;
            toggle_mode((host.as_str(), port), config.server.io_timeout()).await?;
            println!("Mode toggled on {}:{}", host, port);
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|cfg| cfg.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Tee to the console only in the foreground; redirected stdout would duplicate lines
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
