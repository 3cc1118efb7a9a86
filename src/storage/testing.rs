//! A recording store for command-layer tests.
//!
//! Every call is logged as a short line (`"mset a=1 b=2"`) before being
//! delegated to an inner [`MemoryStore`]. If a failure is armed, every call
//! returns it instead, so tests can check that store errors surface verbatim.

use crate::storage::{KvPair, MemoryStore, Store, StoreError, StoreResult};
use bytes::Bytes;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    calls: Mutex<Vec<String>>,
    failure: Option<StoreError>,
}

fn text(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn join(keys: &[Bytes]) -> String {
    keys.iter().map(|k| text(k)).collect::<Vec<_>>().join(" ")
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Direct access to the backing data, bypassing the call log.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl Store for ScriptedStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        self.record(format!("get {}", text(key)))?;
        self.inner.get(key)
    }

    fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()> {
        self.record(format!("set {} {}", text(&key), text(&value)))?;
        self.inner.set(key, value)
    }

    fn get_set(&self, key: Bytes, value: Bytes) -> StoreResult<Option<Bytes>> {
        self.record(format!("get_set {} {}", text(&key), text(&value)))?;
        self.inner.get_set(key, value)
    }

    fn set_nx(&self, key: Bytes, value: Bytes) -> StoreResult<bool> {
        self.record(format!("set_nx {} {}", text(&key), text(&value)))?;
        self.inner.set_nx(key, value)
    }

    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        self.record(format!("exists {}", text(key)))?;
        self.inner.exists(key)
    }

    fn incr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        self.record(format!("incr_by {} {}", text(key), delta))?;
        self.inner.incr_by(key, delta)
    }

    fn decr_by(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        self.record(format!("decr_by {} {}", text(key), delta))?;
        self.inner.decr_by(key, delta)
    }

    fn del(&self, keys: &[Bytes]) -> StoreResult<u64> {
        self.record(format!("del {}", join(keys)))?;
        self.inner.del(keys)
    }

    fn mset(&self, pairs: Vec<KvPair>) -> StoreResult<()> {
        let listed: Vec<String> = pairs
            .iter()
            .map(|p| format!("{}={}", text(&p.key), text(&p.value)))
            .collect();
        self.record(format!("mset {}", listed.join(" ")))?;
        self.inner.mset(pairs)
    }

    fn mget(&self, keys: &[Bytes]) -> StoreResult<Vec<Option<Bytes>>> {
        self.record(format!("mget {}", join(keys)))?;
        self.inner.mget(keys)
    }

    fn expire(&self, key: &[u8], seconds: i64) -> StoreResult<bool> {
        self.record(format!("expire {} {}", text(key), seconds))?;
        self.inner.expire(key, seconds)
    }

    fn expire_at(&self, key: &[u8], unix_secs: i64) -> StoreResult<bool> {
        self.record(format!("expire_at {} {}", text(key), unix_secs))?;
        self.inner.expire_at(key, unix_secs)
    }

    fn ttl(&self, key: &[u8]) -> StoreResult<i64> {
        self.record(format!("ttl {}", text(key)))?;
        self.inner.ttl(key)
    }

    fn persist(&self, key: &[u8]) -> StoreResult<bool> {
        self.record(format!("persist {}", text(key)))?;
        self.inner.persist(key)
    }

    fn scan(
        &self,
        start: Option<&[u8]>,
        limit: usize,
        inclusive: bool,
        pattern: Option<&[u8]>,
    ) -> StoreResult<Vec<Bytes>> {
        self.record(format!(
            "scan {} {} {} {}",
            start.map_or_else(|| "-".to_string(), text),
            limit,
            inclusive,
            pattern.map_or_else(|| "-".to_string(), text),
        ))?;
        self.inner.scan(start, limit, inclusive, pattern)
    }
}
