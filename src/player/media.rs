//! The media element the player drives
//!
//! The host document owns the element; the player only reads playback state
//! and swaps its source. [`HeadlessMediaElement`] keeps the same contract in
//! memory for the CLI and for tests.

use std::sync::Mutex;
use tracing::debug;

/// Host media element contract
pub trait MediaElement: Send + Sync {
    /// Current source: a playlist link before attachment, then a track link
    /// or a `blob:` reference
    fn src(&self) -> String;

    /// Replace the source; loading a new source pauses and rewinds
    fn set_src(&self, src: &str);

    fn play(&self);

    fn is_paused(&self) -> bool;

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Track length in seconds, NaN while unknown
    fn duration(&self) -> f64;

    /// Show the current track to the listener
    fn set_title(&self, _title: &str) {}

    /// Elements that play playlists natively are left alone
    fn can_play_playlists(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct MediaState {
    src: String,
    paused: bool,
    current_time: f64,
    duration: f64,
    title: String,
    sources: Vec<String>,
    play_requests: usize,
}

/// In-memory media element
#[derive(Debug)]
pub struct HeadlessMediaElement {
    state: Mutex<MediaState>,
    native_playlists: bool,
}

impl HeadlessMediaElement {
    pub fn new(src: &str) -> Self {
        Self {
            state: Mutex::new(MediaState {
                src: src.to_string(),
                paused: true,
                current_time: 0.0,
                duration: f64::NAN,
                title: String::new(),
                sources: Vec::new(),
                play_requests: 0,
            }),
            native_playlists: false,
        }
    }

    /// An element claiming native playlist support
    pub fn with_native_playlists(mut self) -> Self {
        self.native_playlists = true;
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MediaState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Move the playhead, as if the listener had been playing for a while
    pub fn seek(&self, seconds: f64) {
        self.with_state(|s| s.current_time = seconds);
    }

    /// Play the current track to its end: pauses with position equal to duration
    pub fn finish_track(&self, length_seconds: f64) {
        self.with_state(|s| {
            s.duration = length_seconds;
            s.current_time = length_seconds;
            s.paused = true;
        });
    }

    pub fn title(&self) -> String {
        self.with_state(|s| s.title.clone())
    }

    /// Every source set since creation, oldest first
    pub fn source_history(&self) -> Vec<String> {
        self.with_state(|s| s.sources.clone())
    }

    pub fn play_requests(&self) -> usize {
        self.with_state(|s| s.play_requests)
    }
}

impl MediaElement for HeadlessMediaElement {
    fn src(&self) -> String {
        self.with_state(|s| s.src.clone())
    }

    fn set_src(&self, src: &str) {
        debug!("Media source set to {}", src);
        self.with_state(|s| {
            s.src = src.to_string();
            s.sources.push(src.to_string());
            s.paused = true;
            s.current_time = 0.0;
            s.duration = f64::NAN;
        });
    }

    fn play(&self) {
        self.with_state(|s| {
            s.paused = false;
            s.play_requests += 1;
        });
    }

    fn is_paused(&self) -> bool {
        self.with_state(|s| s.paused)
    }

    fn current_time(&self) -> f64 {
        self.with_state(|s| s.current_time)
    }

    fn duration(&self) -> f64 {
        self.with_state(|s| s.duration)
    }

    fn set_title(&self, title: &str) {
        self.with_state(|s| s.title = title.to_string());
    }

    fn can_play_playlists(&self) -> bool {
        self.native_playlists
    }
}
