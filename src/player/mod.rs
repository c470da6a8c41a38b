//! Playlist playback for media elements

pub mod controller;
pub mod media;
pub mod object_url;
pub mod services;

pub use controller::{PlayerController, PlayerPhase, PlayerState};
pub use media::{HeadlessMediaElement, MediaElement};
pub use object_url::ObjectUrlRegistry;
pub use services::PlayerServices;
