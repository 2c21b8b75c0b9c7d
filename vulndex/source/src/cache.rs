use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Memo cache for remote content, shared for the process lifetime.
///
/// Expiry is lazy: a lookup past the TTL evicts the entry and reports a
/// miss. There is no size bound and no background sweep. Inserts overwrite
/// unconditionally, so racing fetchers populating the same key are harmless.
pub struct MemoCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: Value,
    inserted: Instant,
}

/// Key for a raw directory listing or file envelope.
pub fn content_key(path: &str) -> String {
    format!("content:{path}")
}

/// Key for a decoded JSON file body. Kept apart from [`content_key`] so a
/// path never aliases between the two kinds.
pub fn json_key(path: &str) -> String {
    format!("json:{path}")
}

impl MemoCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if self.clock.now().duration_since(entry.inserted) > self.ttl => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub fn insert(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted: self.clock.now(),
            },
        );
    }
}
