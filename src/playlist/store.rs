//! Flattened playlist cache with bounded nested-playlist expansion

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::entry::{PlaylistEntry, ResolvedPlaylist, playlist_key, splice_bounded};
use super::fetcher::PlaylistFetcher;
use crate::errors::{PlayerError, PlayerResult};
use crate::utils::url::UrlUtils;

/// Process-wide mapping from playlist URL to its flattened track list
///
/// Lists are never edited in place. An expansion builds a new list and swaps
/// it in, so a controller holding an `Arc` to the previous version keeps a
/// consistent view.
pub struct PlaylistStore {
    fetcher: PlaylistFetcher,
    playlists: RwLock<HashMap<String, Arc<ResolvedPlaylist>>>,
    max_length: usize,
}

impl PlaylistStore {
    pub fn new(fetcher: PlaylistFetcher, max_length: usize) -> Self {
        Self {
            fetcher,
            playlists: RwLock::new(HashMap::new()),
            max_length,
        }
    }

    pub fn fetcher(&self) -> &PlaylistFetcher {
        &self.fetcher
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Cached flattened list, without fetching
    pub async fn get(&self, url: &Url) -> Option<Arc<ResolvedPlaylist>> {
        self.playlists.read().await.get(&playlist_key(url)).cloned()
    }

    /// Return the flattened list for `url`, fetching and expanding it if needed
    ///
    /// Nested playlists are fetched fresh on every top-level resolution. If
    /// any fetch in the chain fails, nothing is cached and the error is
    /// returned.
    pub async fn resolve(&self, url: &Url) -> PlayerResult<Arc<ResolvedPlaylist>> {
        if let Some(cached) = self.get(url).await {
            debug!("Playlist {} served from cache", UrlUtils::obfuscate_credentials(url.as_str()));
            return Ok(cached);
        }

        let entries = self.fetcher.fetch(url).await?;
        let entries = self.expand(entries).await?;

        let key = playlist_key(url);
        let resolved = Arc::new(ResolvedPlaylist::new(key.clone(), entries));
        info!(
            "Resolved playlist {} into {} entries ({} left unexpanded)",
            UrlUtils::obfuscate_credentials(url.as_str()),
            resolved.len(),
            resolved.unresolved_count()
        );

        self.playlists.write().await.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Expand nested playlists with a work list until none remain or the bound is hit
    ///
    /// The position after a splice is examined again, so nested playlists
    /// inside nested playlists are expanded too. Within one pass each nested
    /// URL is downloaded at most once. A nested URL that comes back to the
    /// same position without the list having changed length is a loop and
    /// is left unexpanded.
    async fn expand(&self, mut entries: Vec<PlaylistEntry>) -> PlayerResult<Vec<PlaylistEntry>> {
        entries.truncate(self.max_length);

        let mut fetched: HashMap<String, Vec<PlaylistEntry>> = HashMap::new();
        let mut index = 0;
        // (nested url, list length) already expanded at the current index
        let mut expanded_here: HashSet<(String, usize)> = HashSet::new();

        while index < entries.len() {
            if !entries[index].is_nested_playlist() || entries.len() >= self.max_length {
                index += 1;
                expanded_here.clear();
                continue;
            }

            let nested_url = entries[index].url().clone();
            if !expanded_here.insert((nested_url.to_string(), entries.len())) {
                debug!(
                    "Nested playlist {} loops back to position {}, leaving it unexpanded",
                    UrlUtils::obfuscate_credentials(nested_url.as_str()),
                    index
                );
                index += 1;
                expanded_here.clear();
                continue;
            }

            let nested = match fetched.get(nested_url.as_str()) {
                Some(nested) => nested.clone(),
                None => {
                    debug!(
                        "Expanding nested playlist {} at position {}",
                        UrlUtils::obfuscate_credentials(nested_url.as_str()),
                        index
                    );
                    let nested = self.fetcher.fetch(&nested_url).await?;
                    fetched.insert(nested_url.to_string(), nested.clone());
                    nested
                }
            };

            splice_bounded(&mut entries, index, nested, self.max_length);
        }

        Ok(entries)
    }

    /// Fetch the nested playlist at `index` of a cached list and splice it in
    ///
    /// Used for entries left unexpanded by [`resolve`](Self::resolve). Only one
    /// level is expanded; the caller looks at the same index again afterwards.
    pub async fn expand_at(&self, url: &Url, index: usize) -> PlayerResult<Arc<ResolvedPlaylist>> {
        let current = self
            .get(url)
            .await
            .ok_or_else(|| PlayerError::UnknownPlaylist { url: url.to_string() })?;

        let entry = match current.get(index) {
            Some(entry) if entry.is_nested_playlist() => entry.clone(),
            _ => return Ok(current),
        };

        // Fetched fresh: a nested playlist may legitimately change between plays
        let nested = self.fetcher.fetch(entry.url()).await?;

        let mut playlists = self.playlists.write().await;
        let key = playlist_key(url);
        // Another expansion may have replaced the list while we were fetching
        let base = match playlists.get(&key) {
            Some(latest) if latest.get(index) == Some(&entry) => latest.clone(),
            Some(latest) => {
                warn!(
                    "Playlist {} changed during expansion of position {}, keeping newer version",
                    UrlUtils::obfuscate_credentials(url.as_str()),
                    index
                );
                return Ok(latest.clone());
            }
            None => current,
        };

        let mut entries = base.entries().to_vec();
        splice_bounded(&mut entries, index, nested, self.max_length);
        let expanded = Arc::new(ResolvedPlaylist::new(key.clone(), entries));
        debug!(
            "Expanded position {} of {}: now {} entries",
            index,
            UrlUtils::obfuscate_credentials(url.as_str()),
            expanded.len()
        );
        playlists.insert(key, expanded.clone());
        Ok(expanded)
    }
}
