//! In-Memory Ordered Store
//!
//! A [`Store`] backed by a single `BTreeMap` so that keys are always held in
//! ascending byte order, which is what SCAN pagination relies on.
//!
//! ## Design Decisions
//!
//! 1. **Ordered map**: `BTreeMap<Bytes, Entry>` gives range queries for SCAN.
//! 2. **One RwLock**: concurrent readers, exclusive writers. Every trait call
//!    takes the lock once, so each command is atomic with respect to others.
//! 3. **Lazy expiry**: expired entries are invisible to reads and removed by
//!    the next write that touches them. There is no background sweeper.

use crate::storage::{GlobPattern, KvPair, Store, StoreError, StoreResult};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// A stored value with an optional deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<SystemTime>,
}

impl Entry {
    fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    #[inline]
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// The bundled ordered key-value store.
///
/// # Example
///
/// ```
/// use ordkv::storage::{MemoryStore, Store};
/// use bytes::Bytes;
///
/// let store = MemoryStore::new();
/// store.set(Bytes::from("b"), Bytes::from("2")).unwrap();
/// store.set(Bytes::from("a"), Bytes::from("1")).unwrap();
///
/// let keys = store.scan(None, 10, false, None).unwrap();
/// assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("b")]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Bytes, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub fn len(&self) -> StoreResult<usize> {
        let now = SystemTime::now();
        Ok(self.read()?.values().filter(|e| !e.is_expired(now)).count())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<Bytes, Entry>>> {
        self.data.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<Bytes, Entry>>> {
        self.data.write().map_err(|_| StoreError::Poisoned)
    }

    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live_mut<'a>(
        data: &'a mut BTreeMap<Bytes, Entry>,
        key: &[u8],
        now: SystemTime,
    ) -> Option<&'a mut Entry> {
        if data.get(key).is_some_and(|e| e.is_expired(now)) {
            trace!(key = ?Bytes::copy_from_slice(key), "Dropping expired key");
            data.remove(key);
            return None;
        }
        data.get_mut(key)
    }

    fn set_deadline(&self, key: &[u8], deadline: SystemTime) -> StoreResult<bool> {
        let now = SystemTime::now();
        let mut data = self.write()?;
        match Self::live_mut(&mut data, key, now) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        let now = SystemTime::now();
        let data = self.read()?;
        Ok(data
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()> {
        self.write()?.insert(key, Entry::new(value));
        Ok(())
    }

    fn get_set(&self, key: Bytes, value: Bytes) -> StoreResult<Option<Bytes>> {
        let now = SystemTime::now();
        let mut data = self.write()?;
        let old = data.insert(key, Entry::new(value));
        Ok(old.filter(|e| !e.is_expired(now)).map(|e| e.value))
    }

    fn set_nx(&self, key: Bytes, value: Bytes) -> StoreResult<bool> {
        let now = SystemTime::now();
        let mut data = self.write()?;
        if Self::live_mut(&mut data, &key, now).is_some() {
            return Ok(false);
        }
        data.insert(key, Entry::new(value));
        Ok(true)
    }

    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        let now = SystemTime::now();
        Ok(self.read()?.get(key).is_some_and(|e| !e.is_expired(now)))
    }

    fn incr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        let now = SystemTime::now();
        let mut data = self.write()?;

        let (current, expires_at) = match Self::live_mut(&mut data, key, now) {
            Some(entry) => {
                let n = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or(StoreError::NotInteger)?;
                (n, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current.checked_add(delta).ok_or(StoreError::Overflow)?;
        data.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: Bytes::from(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    fn decr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        let delta = delta.checked_neg().ok_or(StoreError::Overflow)?;
        self.incr_by(key, delta)
    }

    fn del(&self, keys: &[Bytes]) -> StoreResult<u64> {
        let now = SystemTime::now();
        let mut data = self.write()?;
        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = data.remove(key) {
                if !entry.is_expired(now) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    fn mset(&self, pairs: Vec<KvPair>) -> StoreResult<()> {
        let mut data = self.write()?;
        for pair in pairs {
            data.insert(pair.key, Entry::new(pair.value));
        }
        Ok(())
    }

    fn mget(&self, keys: &[Bytes]) -> StoreResult<Vec<Option<Bytes>>> {
        let now = SystemTime::now();
        let data = self.read()?;
        Ok(keys
            .iter()
            .map(|key| {
                data.get(key)
                    .filter(|e| !e.is_expired(now))
                    .map(|e| e.value.clone())
            })
            .collect())
    }

    fn expire(&self, key: &[u8], seconds: i64) -> StoreResult<bool> {
        if seconds <= 0 {
            return Err(StoreError::InvalidExpire);
        }
        let deadline = SystemTime::now()
            .checked_add(Duration::from_secs(seconds as u64))
            .ok_or(StoreError::InvalidExpire)?;
        self.set_deadline(key, deadline)
    }

    fn expire_at(&self, key: &[u8], unix_secs: i64) -> StoreResult<bool> {
        let deadline = u64::try_from(unix_secs)
            .ok()
            .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)))
            .ok_or(StoreError::InvalidExpire)?;
        if deadline <= SystemTime::now() {
            return Err(StoreError::InvalidExpire);
        }
        self.set_deadline(key, deadline)
    }

    fn ttl(&self, key: &[u8]) -> StoreResult<i64> {
        let now = SystemTime::now();
        let data = self.read()?;
        let deadline = data
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expires_at);

        Ok(match deadline {
            Some(exp) => {
                let remaining = exp.duration_since(now).unwrap_or(Duration::ZERO);
                // Round up so a fresh EXPIRE k 100 reports 100
                remaining.as_millis().div_ceil(1000) as i64
            }
            None => -1,
        })
    }

    fn persist(&self, key: &[u8]) -> StoreResult<bool> {
        let now = SystemTime::now();
        let mut data = self.write()?;
        Ok(Self::live_mut(&mut data, key, now)
            .and_then(|entry| entry.expires_at.take())
            .is_some())
    }

    fn scan(
        &self,
        start: Option<&[u8]>,
        limit: usize,
        inclusive: bool,
        pattern: Option<&[u8]>,
    ) -> StoreResult<Vec<Bytes>> {
        let now = SystemTime::now();
        let glob = pattern.map(GlobPattern::new).filter(|g| !g.is_match_all());

        let lower = match start {
            None => Bound::Unbounded,
            Some(key) if inclusive => Bound::Included(key),
            Some(key) => Bound::Excluded(key),
        };

        let data = self.read()?;
        let keys: Vec<Bytes> = data
            .range::<[u8], _>((lower, Bound::Unbounded))
            .filter(|(_, entry)| !entry.is_expired(now))
            .filter(|(key, _)| glob.as_ref().map_or(true, |g| g.matches(key)))
            .take(limit)
            .map(|(key, _)| key.clone())
            .collect();

        trace!(returned = keys.len(), limit, inclusive, "Scanned key range");
        Ok(keys)
    }
}
