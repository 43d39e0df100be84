//! Last-known link status keyed by product id (or normalized URL), with lazy TTL expiry.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::models::LinkStatus;
use crate::prober::classify::{with_tag_check, TagEvidence};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub status: LinkStatus,
    pub http_code: Option<u16>,
    pub product_id: Option<String>,
    /// Normalized URL whose fetch produced this entry
    #[serde(default)]
    pub source_url: Option<String>,
    /// Tag evidence from that fetch; `status` never carries `MISSING_TAG`
    #[serde(default)]
    pub tag: Option<TagEvidence>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, status: LinkStatus, http_code: Option<u16>) -> Self {
        Self {
            key: key.into(),
            status,
            http_code,
            product_id: None,
            source_url: None,
            tag: None,
            cached_at: Utc::now(),
        }
    }

    pub fn with_product_id(mut self, product_id: Option<String>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_source(mut self, source_url: impl Into<String>, tag: Option<TagEvidence>) -> Self {
        self.source_url = Some(source_url.into());
        self.tag = tag;
        self
    }

    /// Status for `url` given whether it carries a tag. The fetching URL
    /// gets its own tag verdict back; other URLs for the same product only
    /// inherit whether the marketplace strips tags.
    pub fn status_for(&self, url: &str, has_tag: bool) -> LinkStatus {
        let missing = self.tag.map(|tag| {
            if self.source_url.as_deref() == Some(url) {
                tag.missing_tag()
            } else {
                tag.missing_tag_for(has_tag)
            }
        });
        with_tag_check(self.status, missing)
    }

    pub fn with_cached_at(mut self, cached_at: DateTime<Utc>) -> Self {
        self.cached_at = cached_at;
        self
    }

    fn is_expired(&self, ttl: ChronoDuration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at) >= ttl
    }
}

/// Shared status cache. Cloning is cheap and clones share storage.
///
/// Writers only ever touch the key they just probed, so a single map-level
/// lock is enough; there is no read-modify-write across keys.
#[derive(Debug, Clone)]
pub struct StatusCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: ChronoDuration,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::hours(24));
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the entry unless it is missing or older than the TTL.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(self.ttl, Utc::now()) => {
                trace!("Cache entry for {} expired at age {}", key, Utc::now() - entry.cached_at);
                None
            }
            Some(entry) => {
                trace!("Cache hit for {}: {}", key, entry.status);
                Some(entry.clone())
            }
            None => None,
        }
    }

    pub async fn put(&self, key: &str, entry: CacheEntry) {
        debug!("Caching {} for {}", entry.status, key);
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops expired entries. Reads never depend on this having run.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl, now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }
}
