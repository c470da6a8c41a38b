//! Track prefetching into a bounded in-memory cache

pub mod cache;
pub mod prefetcher;

pub use cache::{PrefetchEntry, TrackPayload, TrackPrefetchCache};
pub use prefetcher::TrackPrefetcher;
