use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{PlayerError, PlayerResult};

/// A downloaded track, ready to be handed to the media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPayload {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// State of one prefetch slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchEntry {
    /// Fetch started, no payload yet
    Reserved,
    Ready(TrackPayload),
}

impl PrefetchEntry {
    pub fn payload(&self) -> Option<&TrackPayload> {
        match self {
            Self::Reserved => None,
            Self::Ready(payload) => Some(payload),
        }
    }
}

/// Bounded track cache evicting in pure insertion order
///
/// Backed by an [`LruCache`] that is only ever read through `peek`, so no
/// lookup refreshes an entry and the least recently used slot is always the
/// oldest inserted one. A slot may be evicted while still reserved; the late
/// response is then dropped by [`set`](Self::set).
pub struct TrackPrefetchCache {
    entries: RwLock<LruCache<String, PrefetchEntry>>,
}

impl TrackPrefetchCache {
    pub fn new(capacity: usize) -> PlayerResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| PlayerError::configuration("prefetch capacity must be greater than zero"))?;
        Ok(Self {
            entries: RwLock::new(LruCache::new(capacity)),
        })
    }

    pub async fn capacity(&self) -> usize {
        self.entries.read().await.cap().get()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.entries.read().await.contains(url)
    }

    /// Reserve a slot for `url`; returns false when it is already present
    pub async fn reserve(&self, url: &str) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains(url) {
            return false;
        }
        if let Some((evicted, _)) = entries.push(url.to_string(), PrefetchEntry::Reserved) {
            debug!("Evicted prefetched track {}", evicted);
        }
        true
    }

    /// Current state of the slot, without touching eviction order
    pub async fn get(&self, url: &str) -> Option<PrefetchEntry> {
        self.entries.read().await.peek(url).cloned()
    }

    /// Store a downloaded payload; a no-op when the slot was evicted meanwhile
    pub async fn set(&self, url: &str, payload: TrackPayload) -> bool {
        let mut entries = self.entries.write().await;
        match entries.peek_mut(url) {
            Some(slot) => {
                *slot = PrefetchEntry::Ready(payload);
                true
            }
            None => {
                debug!("Dropping payload for evicted track {}", url);
                false
            }
        }
    }

    /// Drop a slot that is still reserved, so a failed download can be retried
    pub async fn forget(&self, url: &str) -> bool {
        let mut entries = self.entries.write().await;
        if matches!(entries.peek(url), Some(PrefetchEntry::Reserved)) {
            entries.pop(url);
            true
        } else {
            false
        }
    }

    /// Keys from oldest to newest
    pub async fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }
}
