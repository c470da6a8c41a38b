//! Centralized error handling for the player core
//!
//! # Error Categories
//!
//! - **Content type errors**: a resource was not served as a playlist
//! - **Network errors**: transport failures and non-success statuses
//! - **URL errors**: links that cannot be resolved against the page origin
//! - **Configuration errors**: invalid configuration values
//!
//! # Usage
//!
//! ```rust
//! use m3u_player::errors::{PlayerError, PlayerResult};
//!
//! fn example_function() -> PlayerResult<String> {
//!     Err(PlayerError::configuration("prefetch capacity must be positive"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using PlayerError
pub type PlayerResult<T> = Result<T, PlayerError>;
