use std::fmt;
use std::ops::Deref;
use url::Url;

use crate::utils::url::UrlUtils;

/// One normalized playlist line: a media track or another playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    url: Url,
    nested: bool,
}

impl PlaylistEntry {
    pub fn new(url: Url) -> Self {
        let nested = UrlUtils::is_playlist(&url);
        Self { url, nested }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn is_nested_playlist(&self) -> bool {
        self.nested
    }

    /// Link without query and fragment, as shown to the listener
    pub fn display_name(&self) -> String {
        UrlUtils::strip_parameters(&self.url).to_string()
    }
}

impl fmt::Display for PlaylistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// A flattened playlist, keyed by its canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    key: String,
    entries: Vec<PlaylistEntry>,
}

impl ResolvedPlaylist {
    pub fn new(key: String, entries: Vec<PlaylistEntry>) -> Self {
        Self { key, entries }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    /// Entries that could not be expanded because the size bound was hit
    pub fn unresolved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_nested_playlist()).count()
    }
}

impl Deref for ResolvedPlaylist {
    type Target = [PlaylistEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

/// Canonical cache key of a playlist URL: query and fragment removed
pub fn playlist_key(url: &Url) -> String {
    UrlUtils::strip_parameters(url).to_string()
}

/// Replace the entry at `index` with `replacement`, never growing past `max_length`
///
/// The replacement is cut short when splicing it whole would overshoot the
/// bound; entries after `index` are always kept.
pub(crate) fn splice_bounded(
    entries: &mut Vec<PlaylistEntry>,
    index: usize,
    replacement: Vec<PlaylistEntry>,
    max_length: usize,
) {
    let room = max_length.saturating_sub(entries.len() - 1);
    let take = replacement.len().min(room);
    entries.splice(index..=index, replacement.into_iter().take(take));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(link: &str) -> PlaylistEntry {
        PlaylistEntry::new(Url::parse(link).unwrap())
    }

    #[test]
    fn test_entry_classification() {
        assert!(entry("http://h:1/a/list.m3u?x=1").is_nested_playlist());
        assert!(!entry("http://h:1/a/track.ogg").is_nested_playlist());
        assert_eq!(entry("http://h:1/a/track.ogg?x=1#t").display_name(), "http://h:1/a/track.ogg");
    }

    #[test]
    fn test_splice_in_place_preserves_order() {
        let mut entries = vec![entry("http://h/1.ogg"), entry("http://h/n.m3u"), entry("http://h/4.ogg")];
        splice_bounded(
            &mut entries,
            1,
            vec![entry("http://h/2.ogg"), entry("http://h/3.ogg")],
            1000,
        );
        let names: Vec<_> = entries.iter().map(|e| e.url().path().to_string()).collect();
        assert_eq!(names, vec!["/1.ogg", "/2.ogg", "/3.ogg", "/4.ogg"]);
    }

    #[test]
    fn test_splice_with_empty_replacement_removes_slot() {
        let mut entries = vec![entry("http://h/n.m3u"), entry("http://h/1.ogg")];
        splice_bounded(&mut entries, 0, Vec::new(), 1000);
        assert_eq!(entries, vec![entry("http://h/1.ogg")]);
    }

    #[test]
    fn test_splice_is_clamped_to_bound() {
        let mut entries = vec![entry("http://h/1.ogg"), entry("http://h/n.m3u"), entry("http://h/9.ogg")];
        let replacement: Vec<_> = (0..10).map(|i| entry(&format!("http://h/r{i}.ogg"))).collect();
        splice_bounded(&mut entries, 1, replacement, 5);

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[1].url().path(), "/r0.ogg");
        assert_eq!(entries[3].url().path(), "/r2.ogg");
        assert_eq!(entries[4].url().path(), "/9.ogg");
    }
}
