//! Command Layer
//!
//! This module turns a decoded command (name plus byte-string arguments) into
//! a single store call and a [`Reply`], or into exactly one [`CommandError`].
//!
//! ## Architecture
//!
//! ```text
//! CommandFrame
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (one per session, cheap to clone)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  CommandTable   │  lookup + Arity check
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  handler / scan │  parse options, one store call
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   dyn Store     │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `GET`, `SET`, `GETSET`, `SETNX`, `EXISTS`, `PERSIST`
//! - `INCR`, `DECR`, `INCRBY`, `DECRBY`
//! - `DEL`, `MSET`, `MGET`
//! - `EXPIRE`, `EXPIREAT`, `TTL`
//! - `SCAN`

pub mod args;
pub mod error;
pub mod handler;
pub mod reply;
pub mod scan;
pub mod table;

pub use error::{CommandError, CommandResult};
pub use handler::CommandHandler;
pub use reply::Reply;
pub use scan::ScanArgs;
pub use table::{Arity, Command, CommandTable, HandlerFn, TableError};
