//! Connection Handler Module
//!
//! Each accepted client is served by its own async task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() + spawn
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ FrameParser │───>│ execute()   │     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ encode+flush│        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pipelined commands are executed in arrival order and their replies are
//! flushed together.
//!
//! ## Example
//!
//! ```no_run
//! use ordkv::commands::{CommandHandler, CommandTable};
//! use ordkv::connection::{handle_connection, ConnectionStats};
//! use ordkv::storage::{MemoryStore, Store};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! # async fn serve() -> anyhow::Result<()> {
//! let table = Arc::new(CommandTable::builtin()?);
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! let handler = CommandHandler::new(table, store);
//! let stats = Arc::new(ConnectionStats::new());
//!
//! let listener = TcpListener::bind("127.0.0.1:6379").await?;
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler, stats));
//! # Ok(())
//! # }
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
