//! Playlist fetching, parsing and flattening
//!
//! [`PlaylistFetcher`] turns one playlist resource into entries,
//! [`PlaylistStore`] flattens nested playlists and caches the result.

pub mod entry;
pub mod fetcher;
pub mod store;

pub use entry::{PlaylistEntry, ResolvedPlaylist, playlist_key};
pub use fetcher::{PlaylistFetcher, parse_playlist};
pub use store::PlaylistStore;
