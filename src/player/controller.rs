//! Per media-element playlist playback
//!
//! A [`PlayerController`] turns a media element whose source is a playlist
//! into a playlist player: it resolves the playlist, points the element at
//! one track at a time and keeps the next few tracks downloading in the
//! background.
//!
//! Failures never reach the host as hard errors. A playlist that cannot be
//! resolved leaves the player inert; a nested playlist that cannot be
//! expanded mid-playback is skipped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::media::MediaElement;
use super::object_url::ObjectUrlRegistry;
use super::services::PlayerServices;
use crate::errors::PlayerResult;
use crate::playlist::ResolvedPlaylist;
use crate::prefetch::TrackPayload;
use crate::utils::url::UrlUtils;

/// Where the controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Idle,
    ResolvingPlaylist,
    Playing(usize),
    AdvancingTrack { from: usize, direction: isize },
}

/// Snapshot of one controller's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub playlist_url: Url,
    pub track_index: usize,
    pub phase: PlayerPhase,
}

type PendingTask = JoinHandle<Option<TrackPayload>>;

pub struct PlayerController {
    media: Arc<dyn MediaElement>,
    services: Arc<PlayerServices>,
    state: Mutex<PlayerState>,
    pending: Mutex<Vec<PendingTask>>,
    /// Cleared on drop; background swaps must not touch the element afterwards
    attached: Arc<Mutex<bool>>,
}

impl PlayerController {
    /// Take over `media` if it needs a playlist player
    ///
    /// Returns `None` when the element plays playlists natively, or when its
    /// source is not a playlist link.
    pub fn attach(media: Arc<dyn MediaElement>, services: Arc<PlayerServices>) -> Option<Self> {
        if media.can_play_playlists() {
            debug!("Media element plays playlists natively, not attaching");
            return None;
        }

        let src = media.src();
        let playlist_url = match services.origin().rewrite(&src) {
            Ok(url) if UrlUtils::is_playlist(&url) => url,
            Ok(_) => return None,
            Err(e) => {
                warn!("Cannot attach player to {}: {}", UrlUtils::obfuscate_credentials(&src), e);
                return None;
            }
        };

        Some(Self {
            media,
            services,
            state: Mutex::new(PlayerState {
                playlist_url,
                track_index: 0,
                phase: PlayerPhase::Idle,
            }),
            pending: Mutex::new(Vec::new()),
            attached: Arc::new(Mutex::new(true)),
        })
    }

    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PlayerState {
        self.state().clone()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.state().phase
    }

    pub fn track_index(&self) -> usize {
        self.state().track_index
    }

    pub fn playlist_url(&self) -> Url {
        self.state().playlist_url.clone()
    }

    pub fn media(&self) -> &Arc<dyn MediaElement> {
        &self.media
    }

    /// The flattened playlist as currently cached
    pub async fn playlist(&self) -> Option<Arc<ResolvedPlaylist>> {
        self.services.store().get(&self.playlist_url()).await
    }

    /// Resolve the playlist and load its first track
    ///
    /// Playback is not started. On failure the controller returns to
    /// [`PlayerPhase::Idle`] and stays inert; nothing is retried. A playlist
    /// without a playable track also leaves it idle.
    pub async fn initialize(&self) -> PlayerResult<()> {
        let url = {
            let mut state = self.state();
            state.phase = PlayerPhase::ResolvingPlaylist;
            state.track_index = 0;
            state.playlist_url.clone()
        };

        match self.services.store().resolve(&url).await {
            Ok(playlist) => {
                info!(
                    "Playlist {} ready with {} tracks",
                    UrlUtils::obfuscate_credentials(url.as_str()),
                    playlist.len()
                );
                self.state().phase = PlayerPhase::Playing(0);
                if !self.update_src(0, false, None).await {
                    info!("Playlist has no playable track");
                }
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Could not resolve playlist {}: {}",
                    UrlUtils::obfuscate_credentials(url.as_str()),
                    e
                );
                self.state().phase = PlayerPhase::Idle;
                Err(e)
            }
        }
    }

    /// Move `diff` tracks forward or backward and start playing
    ///
    /// Returns false, leaving everything untouched, when the target is before
    /// the first or past the last track. There is no wraparound. Also false
    /// when no playable track was found from the target onwards; the current
    /// track is kept then.
    pub async fn change_track(&self, diff: isize) -> bool {
        let Some(playlist) = self.playlist().await else {
            return false;
        };

        let (from, next) = {
            let mut state = self.state();
            let from = state.track_index;
            let Some(next) = from.checked_add_signed(diff).filter(|n| *n < playlist.len()) else {
                return false;
            };
            state.phase = PlayerPhase::AdvancingTrack {
                from,
                direction: diff.signum(),
            };
            state.track_index = next;
            (from, next)
        };

        debug!("Changing track by {} to index {}", diff, next);
        self.update_src(next, true, Some(from)).await
    }

    /// Handle the element's end-of-track notification
    pub async fn on_ended(&self) -> bool {
        if self.media.current_time() >= self.media.duration() {
            self.change_track(1).await
        } else {
            false
        }
    }

    /// Wait for all background downloads started so far
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<PendingTask> = {
                let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
                std::mem::take(&mut *pending)
            };
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                let _ = task.await;
            }
        }
    }

    /// Go back to `fallback` after no track could be loaded
    ///
    /// The index is kept inside a list of `len` entries. Without a fallback,
    /// or with an empty list, the player goes idle.
    fn restore(&self, fallback: Option<usize>, len: usize) {
        let mut state = self.state();
        match fallback.filter(|_| len > 0).map(|index| index.min(len - 1)) {
            Some(index) => {
                state.track_index = index;
                state.phase = PlayerPhase::Playing(index);
            }
            None => {
                state.track_index = 0;
                state.phase = PlayerPhase::Idle;
            }
        }
    }

    fn track_task(&self, task: PendingTask) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        pending.retain(|t| !t.is_finished());
        pending.push(task);
    }

    /// Point the element at the track at `index`
    ///
    /// Unexpanded nested playlists are expanded in place and the same index
    /// is tried again; entries that cannot be expanded are skipped forward.
    /// Returns false, restoring `fallback`, when no track is left to load.
    async fn update_src(&self, mut index: usize, mut play: bool, fallback: Option<usize>) -> bool {
        let url = self.playlist_url();
        let store = self.services.store();
        // (nested url, list length) already expanded at the current index
        let mut expanded_here: HashSet<(String, usize)> = HashSet::new();

        loop {
            let Some(playlist) = store.get(&url).await else {
                self.restore(fallback, 0);
                return false;
            };
            let Some(entry) = playlist.get(index).cloned() else {
                debug!("No track left at index {}", index);
                self.restore(fallback, playlist.len());
                return false;
            };

            if entry.is_nested_playlist() {
                let progressing = expanded_here.insert((entry.as_str().to_string(), playlist.len()));
                if playlist.len() < store.max_length() && progressing {
                    match store.expand_at(&url, index).await {
                        Ok(_) => continue,
                        Err(e) => warn!(
                            "Skipping nested playlist {}: {}",
                            UrlUtils::obfuscate_credentials(entry.as_str()),
                            e
                        ),
                    }
                } else {
                    debug!("Skipping unexpandable nested playlist at index {}", index);
                }

                if index + 1 >= playlist.len() {
                    self.restore(fallback, playlist.len());
                    return false;
                }
                index += 1;
                play = true;
                expanded_here.clear();
                self.state().track_index = index;
                continue;
            }

            self.load_track(&playlist, index, entry.as_str()).await;
            self.media.set_title(&entry.display_name());
            self.prefetch_following(&playlist, index).await;

            {
                let mut state = self.state();
                state.track_index = index;
                state.phase = PlayerPhase::Playing(index);
            }
            info!("Now on track {} of {}: {}", index + 1, playlist.len(), entry.display_name());

            if play {
                self.media.play();
            }
            return true;
        }
    }

    /// Set the element's source for one track, preferring a prefetched payload
    async fn load_track(&self, playlist: &ResolvedPlaylist, index: usize, track_url: &str) {
        let prefetcher = self.services.prefetcher();
        let object_urls = self.services.object_urls();

        if let Some(payload) = prefetcher.ready_payload(track_url).await {
            debug!("Track {} of {} served from prefetch cache", index + 1, playlist.len());
            replace_source(self.media.as_ref(), object_urls, &object_urls.create(payload));
            return;
        }

        replace_source(self.media.as_ref(), object_urls, track_url);

        // An in-memory payload plays more reliably than the raw link; swap to it
        // if the element has not started yet
        if let Some(download) = prefetcher.prefetch(track_url).await {
            let media = self.media.clone();
            let object_urls = object_urls.clone();
            let attached = self.attached.clone();
            let track_url = track_url.to_string();

            self.track_task(tokio::spawn(async move {
                let payload = download.await.ok().flatten()?;
                let attached = attached.lock().unwrap_or_else(|p| p.into_inner());
                if !*attached {
                    return Some(payload);
                }
                if media.is_paused() && media.src() == track_url && media.current_time() == 0.0 {
                    debug!("Swapping {} for its downloaded payload", track_url);
                    replace_source(media.as_ref(), &object_urls, &object_urls.create(payload.clone()));
                }
                Some(payload)
            }));
        }
    }

    async fn prefetch_following(&self, playlist: &ResolvedPlaylist, index: usize) {
        let upcoming = playlist
            .iter()
            .skip(index + 1)
            .take(self.services.lookahead())
            .filter(|entry| !entry.is_nested_playlist());

        for entry in upcoming {
            if let Some(download) = self.services.prefetcher().prefetch(entry.as_str()).await {
                self.track_task(download);
            }
        }
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        *self.attached.lock().unwrap_or_else(|p| p.into_inner()) = false;
        let src = self.media.src();
        if UrlUtils::is_blob(&src) {
            self.services.object_urls().revoke(&src);
        }
    }
}

/// Set a new source and release the `blob:` reference it replaces
fn replace_source(media: &dyn MediaElement, object_urls: &ObjectUrlRegistry, src: &str) {
    let previous = media.src();
    media.set_src(src);
    if previous != src && UrlUtils::is_blob(&previous) {
        object_urls.revoke(&previous);
    }
}
