//! Configuration default values
//!
//! All default values for configuration options live here.

// Page defaults
pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:8888/";

// Playlist defaults
/// Upper bound on a flattened playlist, guards against self-referencing lists
pub const DEFAULT_MAX_PLAYLIST_LENGTH: usize = 1000;
pub const DEFAULT_PLAYLIST_MIME_TYPES: &[&str] = &[
    "audio/x-mpegurl",
    "audio/mpegurl",
    "application/vnd.apple.mpegurl",
    "application/mpegurl",
    "application/x-mpegurl",
];

// Prefetch defaults
pub const DEFAULT_PREFETCH_CAPACITY: usize = 10;
pub const DEFAULT_PREFETCH_LOOKAHEAD: usize = 3;

// HTTP client defaults
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_USER_AGENT: &str = concat!("m3u-player/", env!("CARGO_PKG_VERSION"));

// Environment
pub const ENV_PREFIX: &str = "M3U_PLAYER_";
