//! OrdKV server entry point.
//!
//! Sets up logging, builds the command table and the store, then accepts
//! connections until Ctrl+C.

use anyhow::{bail, Context};
use ordkv::commands::{CommandHandler, CommandTable};
use ordkv::connection::{handle_connection, ConnectionStats};
use ordkv::storage::{MemoryStore, Store};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, PartialEq)]
struct Config {
    host: String,
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: ordkv::DEFAULT_HOST.to_string(),
            port: ordkv::DEFAULT_PORT,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Cli {
    Serve(Config),
    Help,
    Version,
}

impl Config {
    /// Parses configuration from command-line arguments (without argv[0]).
    fn parse<I>(args: I) -> anyhow::Result<Cli>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args.next().context("--host requires a value")?;
                }
                "--port" | "-p" => {
                    let value = args.next().context("--port requires a value")?;
                    config.port = value
                        .parse()
                        .with_context(|| format!("invalid port number: {}", value))?;
                }
                "--help" => return Ok(Cli::Help),
                "--version" | "-v" => return Ok(Cli::Version),
                other => bail!("unknown argument: {}", other),
            }
        }

        Ok(Cli::Serve(config))
    }

    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
OrdKV - A Redis-compatible server over an ordered key-value store

USAGE:
    ordkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 6379)
    -v, --version        Print version information
        --help           Print this help message

Log verbosity follows RUST_LOG (default: info).

EXAMPLES:
    $ redis-cli -p 6379
    127.0.0.1:6379> MSET a 1 b 2 c 3
    OK
    127.0.0.1:6379> SCAN "" COUNT 2
    1) "b"
    2) 1) "a"
       2) "b"
    127.0.0.1:6379> SCAN b COUNT 2
    1) ""
    2) 1) "c"
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::parse(std::env::args().skip(1)) {
        Ok(Cli::Serve(config)) => config,
        Ok(Cli::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Cli::Version) => {
            println!("OrdKV version {}", ordkv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_help();
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let table = Arc::new(CommandTable::builtin().context("building command table")?);
    info!(commands = table.len(), "Command table ready");

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("binding {}", config.bind_address()))?;
    info!(version = ordkv::VERSION, "Listening on {}", config.bind_address());

    let handler = CommandHandler::new(table, store);

    tokio::select! {
        _ = accept_loop(listener, handler, Arc::clone(&stats)) => {}
        res = signal::ctrl_c() => {
            res.context("installing Ctrl+C handler")?;
            info!("Shutdown signal received, stopping server...");
        }
    }

    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Accepts connections forever, one task per client.
async fn accept_loop(listener: TcpListener, handler: CommandHandler, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
