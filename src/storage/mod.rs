//! Store Contract
//!
//! The command layer talks to storage only through the [`Store`] trait defined
//! here. Any ordered key-value engine can sit behind it; this crate ships
//! [`MemoryStore`], a `BTreeMap`-backed implementation with lazy expiry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CommandTable   │  (commands module)
//! └────────┬────────┘
//!          │  &dyn Store
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │               Store trait               │
//! │  get / set / incr_by / mget / scan ...  │
//! └────────┬────────────────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │              MemoryStore                │
//! │   RwLock<BTreeMap<Bytes, Entry>>        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Every operation returns `Result<_, StoreError>`. The command layer never
//! retries or rewrites these errors; they reach the client verbatim.
//!
//! ## Example
//!
//! ```
//! use ordkv::storage::{MemoryStore, Store};
//! use bytes::Bytes;
//!
//! let store = MemoryStore::new();
//! store.set(Bytes::from("name"), Bytes::from("Ariz")).unwrap();
//! assert_eq!(store.get(b"name").unwrap(), Some(Bytes::from("Ariz")));
//! ```

pub mod glob;
pub mod memory;

#[cfg(test)]
pub(crate) mod testing;

use bytes::Bytes;
use thiserror::Error;

pub use glob::GlobPattern;
pub use memory::MemoryStore;

/// Errors reported by a store implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored value cannot be interpreted as a 64-bit integer
    #[error("value is not an integer or out of range")]
    NotInteger,

    /// An increment or decrement left the i64 range
    #[error("increment or decrement would overflow")]
    Overflow,

    /// A relative expiry was not positive, or an absolute one is in the past
    #[error("invalid expire time")]
    InvalidExpire,

    /// A lock guarding the data was poisoned by a panicking writer
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A key/value pair for bulk writes.
///
/// Duplicate keys in one batch are applied in order, so the last one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: Bytes,
    pub value: Bytes,
}

impl KvPair {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The ordered key-value operations the command layer depends on.
///
/// Implementations own all synchronization. A handler issues exactly one call
/// per command invocation and waits for it to return.
pub trait Store: Send + Sync {
    /// Returns the value for `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>>;

    /// Stores `value` under `key`, clearing any pending expiry.
    fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()>;

    /// Stores `value` and returns the previous value.
    fn get_set(&self, key: Bytes, value: Bytes) -> StoreResult<Option<Bytes>>;

    /// Stores `value` only if `key` is absent. Returns whether it was written.
    fn set_nx(&self, key: Bytes, value: Bytes) -> StoreResult<bool>;

    fn exists(&self, key: &[u8]) -> StoreResult<bool>;

    /// Adds `delta` to the integer at `key` (missing keys count from 0).
    fn incr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64>;

    /// Subtracts `delta` from the integer at `key` (missing keys count from 0).
    fn decr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64>;

    /// Deletes every listed key and returns how many existed.
    fn del(&self, keys: &[Bytes]) -> StoreResult<u64>;

    /// Writes all pairs in order.
    fn mset(&self, pairs: Vec<KvPair>) -> StoreResult<()>;

    /// Returns one entry per key, in input order.
    fn mget(&self, keys: &[Bytes]) -> StoreResult<Vec<Option<Bytes>>>;

    /// Expires `key` after `seconds`. Returns `false` if the key is absent.
    fn expire(&self, key: &[u8], seconds: i64) -> StoreResult<bool>;

    /// Expires `key` at the given unix time in seconds.
    fn expire_at(&self, key: &[u8], unix_secs: i64) -> StoreResult<bool>;

    /// Remaining lifetime in seconds, or -1 if the key is absent or persistent.
    fn ttl(&self, key: &[u8]) -> StoreResult<i64>;

    /// Removes any expiry from `key`. Returns whether one was removed.
    fn persist(&self, key: &[u8]) -> StoreResult<bool>;

    /// Returns up to `limit` keys in ascending order.
    ///
    /// Keys start strictly after `start` (or at `start` when `inclusive`);
    /// `None` starts at the lowest key. When `pattern` is given only matching
    /// keys are returned, though more may be examined.
    fn scan(
        &self,
        start: Option<&[u8]>,
        limit: usize,
        inclusive: bool,
        pattern: Option<&[u8]>,
    ) -> StoreResult<Vec<Bytes>>;
}
