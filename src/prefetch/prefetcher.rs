use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::cache::{PrefetchEntry, TrackPayload, TrackPrefetchCache};
use crate::utils::http_client::ResourceFetcher;
use crate::utils::url::UrlUtils;

/// Starts background downloads of upcoming tracks into the shared cache
pub struct TrackPrefetcher {
    cache: Arc<TrackPrefetchCache>,
    client: Arc<dyn ResourceFetcher>,
}

impl TrackPrefetcher {
    pub fn new(cache: Arc<TrackPrefetchCache>, client: Arc<dyn ResourceFetcher>) -> Self {
        Self { cache, client }
    }

    pub fn cache(&self) -> &Arc<TrackPrefetchCache> {
        &self.cache
    }

    /// Ready payload for `url`, if one has been downloaded
    pub async fn ready_payload(&self, url: &str) -> Option<TrackPayload> {
        match self.cache.get(url).await {
            Some(PrefetchEntry::Ready(payload)) => Some(payload),
            _ => None,
        }
    }

    /// Reserve `url` and download it in the background
    ///
    /// Returns `None` when the track is already reserved or downloaded. The
    /// task resolves to the payload if it was stored, or `None` when the
    /// download failed or the slot was evicted before it finished.
    pub async fn prefetch(&self, url: &str) -> Option<JoinHandle<Option<TrackPayload>>> {
        if !self.cache.reserve(url).await {
            return None;
        }

        debug!("Prefetching track {}", UrlUtils::obfuscate_credentials(url));
        let cache = self.cache.clone();
        let client = self.client.clone();
        let url = url.to_string();

        Some(tokio::spawn(async move {
            match client.fetch(&url).await {
                Ok(resource) => {
                    let payload = TrackPayload {
                        bytes: resource.body,
                        mime_type: resource.mime_type,
                    };
                    cache.set(&url, payload.clone()).await.then_some(payload)
                }
                Err(e) => {
                    warn!("Prefetch of {} failed: {}", UrlUtils::obfuscate_credentials(&url), e);
                    cache.forget(&url).await;
                    None
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlayerError;
    use crate::utils::http_client::{FetchedResource, MockResourceFetcher};

    #[tokio::test]
    async fn test_prefetch_fills_cache_once() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchedResource::new("audio/ogg", "OggS")));

        let prefetcher = TrackPrefetcher::new(Arc::new(TrackPrefetchCache::new(10).unwrap()), Arc::new(mock));
        let handle = prefetcher.prefetch("http://h/a.ogg").await.unwrap();
        assert!(prefetcher.prefetch("http://h/a.ogg").await.is_none());

        let payload = handle.await.unwrap().unwrap();
        assert_eq!(payload.mime_type, "audio/ogg");
        assert_eq!(prefetcher.ready_payload("http://h/a.ogg").await, Some(payload));
    }

    #[tokio::test]
    async fn test_failed_prefetch_releases_reservation() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(2)
            .returning(|url| Err(PlayerError::network(url, "HTTP 503 Service Unavailable")));

        let prefetcher = TrackPrefetcher::new(Arc::new(TrackPrefetchCache::new(10).unwrap()), Arc::new(mock));
        let handle = prefetcher.prefetch("http://h/a.ogg").await.unwrap();
        assert!(handle.await.unwrap().is_none());
        assert!(!prefetcher.cache().contains("http://h/a.ogg").await);

        // a later request retries
        let handle = prefetcher.prefetch("http://h/a.ogg").await.unwrap();
        assert!(handle.await.unwrap().is_none());
    }
}
