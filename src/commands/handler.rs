//! Command Handlers
//!
//! One function per command. Each receives the argument vector (already
//! arity-checked by the table), makes exactly one store call, and maps the
//! result onto a [`Reply`]:
//!
//! - booleans and counts become integers
//! - single values become bulk or null bulk replies
//! - multi-value reads become arrays of bulk replies in input order
//! - write acknowledgements become the `OK` status
//!
//! Store errors are returned untouched through `?`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ CommandFrame│───>│  dispatch() │───>│  handler fn │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                          dyn Store          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::args::{fixed, parse_i64};
use crate::commands::{CommandResult, CommandTable, Reply};
use crate::protocol::CommandFrame;
use crate::storage::{KvPair, Store};
use bytes::Bytes;
use std::sync::Arc;

/// Executes decoded frames for one session.
///
/// Cloning is cheap: the table and the store are shared behind `Arc`s.
#[derive(Clone)]
pub struct CommandHandler {
    /// The immutable command table
    table: Arc<CommandTable>,
    /// The store every command runs against
    store: Arc<dyn Store>,
}

impl CommandHandler {
    pub fn new(table: Arc<CommandTable>, store: Arc<dyn Store>) -> Self {
        Self { table, store }
    }

    /// Executes a frame and returns its reply or error.
    pub fn execute(&self, frame: &CommandFrame) -> CommandResult {
        self.table.dispatch(&frame.name, &frame.args, self.store.as_ref())
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("commands", &self.table.len())
            .finish()
    }
}

// ============================================================================
// Single-key commands
// ============================================================================

/// GET key
pub fn get(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "get")?;
    Ok(Reply::Bulk(store.get(key)?))
}

/// SET key value
pub fn set(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, value] = fixed::<2>(args, "set")?;
    store.set(key.clone(), value.clone())?;
    Ok(Reply::ok())
}

/// GETSET key value
pub fn getset(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, value] = fixed::<2>(args, "getset")?;
    Ok(Reply::Bulk(store.get_set(key.clone(), value.clone())?))
}

/// SETNX key value
pub fn setnx(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, value] = fixed::<2>(args, "setnx")?;
    Ok(Reply::from_bool(store.set_nx(key.clone(), value.clone())?))
}

/// EXISTS key
pub fn exists(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "exists")?;
    Ok(Reply::from_bool(store.exists(key)?))
}

/// PERSIST key
pub fn persist(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "persist")?;
    Ok(Reply::from_bool(store.persist(key)?))
}

// ============================================================================
// Counters
// ============================================================================

/// INCR key
pub fn incr(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "incr")?;
    Ok(Reply::integer(store.incr_by(key, 1)?))
}

/// DECR key
pub fn decr(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "decr")?;
    Ok(Reply::integer(store.decr_by(key, 1)?))
}

/// INCRBY key increment
pub fn incrby(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, delta] = fixed::<2>(args, "incrby")?;
    let delta = parse_i64(delta)?;
    Ok(Reply::integer(store.incr_by(key, delta)?))
}

/// DECRBY key decrement
pub fn decrby(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, delta] = fixed::<2>(args, "decrby")?;
    let delta = parse_i64(delta)?;
    Ok(Reply::integer(store.decr_by(key, delta)?))
}

// ============================================================================
// Batches
// ============================================================================

/// DEL key [key ...]
pub fn del(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let deleted = store.del(args)?;
    Ok(Reply::integer(deleted as i64))
}

/// MSET key value [key value ...]
pub fn mset(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let pairs = args
        .chunks_exact(2)
        .map(|pair| KvPair::new(pair[0].clone(), pair[1].clone()))
        .collect();
    store.mset(pairs)?;
    Ok(Reply::ok())
}

/// MGET key [key ...]
pub fn mget(args: &[Bytes], store: &dyn Store) -> CommandResult {
    Ok(Reply::bulk_array(store.mget(args)?))
}

// ============================================================================
// Expiration
// ============================================================================

/// EXPIRE key seconds
pub fn expire(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, seconds] = fixed::<2>(args, "expire")?;
    let seconds = parse_i64(seconds)?;
    Ok(Reply::from_bool(store.expire(key, seconds)?))
}

/// EXPIREAT key unix-time-seconds
pub fn expireat(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key, when] = fixed::<2>(args, "expireat")?;
    let when = parse_i64(when)?;
    Ok(Reply::from_bool(store.expire_at(key, when)?))
}

/// TTL key
pub fn ttl(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let [key] = fixed::<1>(args, "ttl")?;
    Ok(Reply::integer(store.ttl(key)?))
}
