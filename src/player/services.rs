use std::sync::Arc;
use tracing::info;

use super::object_url::ObjectUrlRegistry;
use crate::config::Config;
use crate::errors::PlayerResult;
use crate::playlist::{PlaylistFetcher, PlaylistStore};
use crate::prefetch::{TrackPrefetchCache, TrackPrefetcher};
use crate::utils::http_client::ResourceFetcher;
use crate::utils::url::PageOrigin;

/// Page-wide services shared by every player on the page
///
/// Built once at startup and handed to each controller.
pub struct PlayerServices {
    origin: PageOrigin,
    store: PlaylistStore,
    prefetcher: TrackPrefetcher,
    object_urls: Arc<ObjectUrlRegistry>,
    lookahead: usize,
}

impl PlayerServices {
    pub fn from_config(config: &Config, client: Arc<dyn ResourceFetcher>) -> PlayerResult<Arc<Self>> {
        config.validate()?;
        let origin = PageOrigin::new(config.page_url()?);

        let fetcher = PlaylistFetcher::new(client.clone(), origin.clone(), &config.playlist.mime_types);
        let store = PlaylistStore::new(fetcher, config.playlist.max_length);
        let cache = Arc::new(TrackPrefetchCache::new(config.prefetch.capacity)?);
        let prefetcher = TrackPrefetcher::new(cache, client);
        let object_urls = Arc::new(ObjectUrlRegistry::new(&origin));

        info!(
            "Player services ready for {} (max playlist length {}, prefetch capacity {}, lookahead {})",
            origin.page_url(),
            config.playlist.max_length,
            config.prefetch.capacity,
            config.prefetch.lookahead
        );

        Ok(Arc::new(Self {
            origin,
            store,
            prefetcher,
            object_urls,
            lookahead: config.prefetch.lookahead,
        }))
    }

    pub fn origin(&self) -> &PageOrigin {
        &self.origin
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn prefetcher(&self) -> &TrackPrefetcher {
        &self.prefetcher
    }

    pub fn prefetch_cache(&self) -> &Arc<TrackPrefetchCache> {
        self.prefetcher.cache()
    }

    pub fn object_urls(&self) -> &Arc<ObjectUrlRegistry> {
        &self.object_urls
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }
}
