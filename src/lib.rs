//! # OrdKV - A Redis-Compatible Command Layer over an Ordered Store
//!
//! OrdKV speaks RESP, routes each command through a fixed table of
//! handlers, and runs it against a key-ordered store. Because keys are kept
//! in byte order, `SCAN` can page through the keyspace with a cursor that is
//! simply the last key the client saw. The server keeps no scan state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               OrdKV                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Table      │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌────────────────────────────┐   │
//! │                     │ RESP parser │    │  dyn Store                 │   │
//! │                     │ + encoder   │    │  (MemoryStore: BTreeMap)   │   │
//! │                     └─────────────┘    └────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ordkv::commands::{CommandTable, Reply};
//! use ordkv::storage::MemoryStore;
//! use bytes::Bytes;
//!
//! let table = CommandTable::builtin().unwrap();
//! let store = MemoryStore::new();
//!
//! for key in ["a", "b", "c"] {
//!     let args = vec![Bytes::from(key), Bytes::from("v")];
//!     table.dispatch(b"SET", &args, &store).unwrap();
//! }
//!
//! let args = vec![Bytes::new(), Bytes::from("count"), Bytes::from("2")];
//! let page = table.dispatch(b"scan", &args, &store).unwrap();
//! let parts = page.as_array().unwrap();
//! assert_eq!(parts[0].as_bytes(), Some(&b"b"[..]));
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP frame decoder and reply encoder
//! - [`storage`]: the `Store` trait, glob patterns and the in-memory store
//! - [`commands`]: command table, handlers and the scan cursor protocol
//! - [`connection`]: client connection management

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler, CommandTable, Reply};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{CommandFrame, FrameParser, ParseError};
pub use storage::{MemoryStore, Store, StoreError};

/// The default port OrdKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host OrdKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of OrdKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
