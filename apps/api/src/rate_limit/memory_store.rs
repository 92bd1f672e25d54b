use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CounterStore, StoreError};

struct Entry {
    count: i64,
    expires_at: Instant,
}

/// In-process counter store for single-instance deployments and tests.
/// Counts are lost on restart and are not shared between processes.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            count: 0,
            expires_at: now,
        });
        entry.count += 1;
        if entry.count == 1 {
            entry.expires_at = now + ttl;
        }
        Ok(entry.count)
    }
}
