use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::event::UpcomingEvent;

/// Age after which a cache entry is ignored on read.
pub const CACHE_TTL_SECS: i64 = 5 * 60;

/// What is stored on disk for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub written_at: DateTime<Utc>,
    pub events: Vec<UpcomingEvent>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.written_at > ttl
    }
}

/// Cache key for a channel. Bytes outside `[A-Za-z0-9_-]` are written as
/// `%XX`, so the key is always a plain file name and distinct ids never
/// share an entry.
pub fn channel_key(channel_id: &str) -> String {
    let mut key = String::from("upcoming_");
    for b in channel_id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            key.push(b as char);
        } else {
            key.push_str(&format!("%{:02X}", b));
        }
    }
    key
}

/// One JSON file per key under `dir`. Failures are logged and absorbed:
/// a broken cache only means every run goes to the network.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            ttl: Duration::seconds(CACHE_TTL_SECS),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn read(&self, key: &str) -> Option<Vec<UpcomingEvent>> {
        self.read_at(key, Utc::now())
    }

    pub fn read_at(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<UpcomingEvent>> {
        let path = self.entry_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!("[cache] miss key={}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("[cache] ignoring unreadable entry {}: {}", path.display(), e);
                return None;
            }
        };

        if entry.is_expired(now, self.ttl) {
            debug!("[cache] expired key={} written_at={}", key, entry.written_at);
            return None;
        }

        debug!("[cache] hit key={} events={}", key, entry.events.len());
        Some(entry.events)
    }

    /// Overwrite the entry for `key`. Returns whether it was persisted.
    pub async fn write(&self, key: &str, events: &[UpcomingEvent]) -> bool {
        self.write_at(key, events, Utc::now()).await
    }

    pub async fn write_at(&self, key: &str, events: &[UpcomingEvent], now: DateTime<Utc>) -> bool {
        match self.try_write(key, events, now).await {
            Ok(()) => {
                debug!("[cache] wrote key={} events={}", key, events.len());
                true
            }
            Err(e) => {
                warn!("[cache] failed to write key={}: {}", key, e);
                false
            }
        }
    }

    async fn try_write(
        &self,
        key: &str,
        events: &[UpcomingEvent],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry {
            written_at: now,
            events: events.to_vec(),
        };
        let json = serde_json::to_string_pretty(&entry)?;
        tokio::fs::write(self.entry_path(key), json).await?;
        Ok(())
    }
}
