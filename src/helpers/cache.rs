use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const SWEEP_AT: usize = 1024;

/// Read-through cache whose entries expire `ttl` after insertion.
///
/// Expired entries are dropped when read, and all of them are swept on
/// insert once the map holds `SWEEP_AT` entries, so keys that are never
/// looked up again (rotated tokens) do not accumulate.
pub struct TtlCache<V> {
    ttl: Duration,
    sweep_at: usize,
    entries: RwLock<HashMap<String, CachedValue<V>>>,
}

struct CachedValue<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sweep_at: SWEEP_AT,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // expired: drop it unless someone refreshed it meanwhile
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at <= now {
                entries.remove(key);
            } else {
                return Some(entry.value.clone());
            }
        }

        None
    }

    pub async fn insert(&self, key: String, value: V) {
        let now = Instant::now();
        let expires_at = now + self.ttl;
        let mut entries = self.entries.write().await;
        if entries.len() >= self.sweep_at {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(key, CachedValue { value, expires_at });
    }

    /// Drops one entry, or every entry when `key` is `None`.
    pub async fn invalidate(&self, key: Option<&str>) {
        let mut entries = self.entries.write().await;
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }
}
