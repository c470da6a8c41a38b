//! Error type definitions for the player core
//!
//! Every failure the player can observe is one of these variants. None of
//! them is fatal to the host: callers degrade to "do nothing" or "skip to the
//! next track". Prefetch cache eviction is not an error: a discarded in-flight
//! result is dropped silently.

use thiserror::Error;

/// Top-level player error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The fetched resource was not served as an allow-listed playlist type.
    ///
    /// Security relevant: only resources already classified upstream as
    /// playlists may be parsed as such. Never retried automatically.
    #[error("Invalid content type for playlist {url}: {content_type}")]
    InvalidContentType { url: String, content_type: String },

    /// The fetch could not complete (transport error or non-success status)
    #[error("Network failure fetching {url}: {message}")]
    NetworkFailure { url: String, message: String },

    /// A link could not be parsed or rewritten to the page origin
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Invalid configuration values
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A playlist was looked up before it was resolved
    #[error("Playlist not resolved: {url}")]
    UnknownPlaylist { url: String },
}

/// Convenience methods for creating common error types
impl PlayerError {
    /// Create an invalid content type error
    pub fn invalid_content_type<U: Into<String>, C: Into<String>>(url: U, content_type: C) -> Self {
        Self::InvalidContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a network failure error
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::NetworkFailure {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
