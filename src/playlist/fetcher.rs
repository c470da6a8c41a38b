//! Playlist download and parsing
//!
//! A playlist is plain UTF-8 text: comment/directive lines start with `#`,
//! every other non-blank line is a link. Only resources served with one of
//! the allow-listed playlist content types are parsed at all.

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::entry::PlaylistEntry;
use crate::errors::{PlayerError, PlayerResult};
use crate::utils::http_client::{ResourceFetcher, mime_essence};
use crate::utils::url::{PageOrigin, UrlUtils};

/// Fetches playlist resources and turns them into normalized entries
pub struct PlaylistFetcher {
    client: Arc<dyn ResourceFetcher>,
    origin: PageOrigin,
    allowed_mime_types: Vec<String>,
}

impl PlaylistFetcher {
    pub fn new(
        client: Arc<dyn ResourceFetcher>,
        origin: PageOrigin,
        allowed_mime_types: &[String],
    ) -> Self {
        Self {
            client,
            origin,
            allowed_mime_types: allowed_mime_types.iter().map(|m| mime_essence(m)).collect(),
        }
    }

    pub fn origin(&self) -> &PageOrigin {
        &self.origin
    }

    pub fn is_allowed_mime_type(&self, mime_type: &str) -> bool {
        let essence = mime_essence(mime_type);
        self.allowed_mime_types.iter().any(|allowed| *allowed == essence)
    }

    /// Download `url` and parse it into host-rewritten entries
    ///
    /// Does not touch any cache; storing the result is the caller's job.
    pub async fn fetch(&self, url: &Url) -> PlayerResult<Vec<PlaylistEntry>> {
        let resource = self.client.fetch(url.as_str()).await?;

        if !self.is_allowed_mime_type(&resource.mime_type) {
            warn!(
                "Playlist {} must have one of the MIME types {:?} but had '{}'",
                UrlUtils::obfuscate_credentials(url.as_str()),
                self.allowed_mime_types,
                resource.mime_type
            );
            return Err(PlayerError::invalid_content_type(
                url.as_str(),
                resource.mime_type,
            ));
        }

        let text = String::from_utf8_lossy(&resource.body);
        let entries = parse_playlist(&text, &self.origin)?;
        debug!(
            "Parsed {} entries from playlist {}",
            entries.len(),
            UrlUtils::obfuscate_credentials(url.as_str())
        );
        Ok(entries)
    }
}

/// Parse playlist text into entries rewritten onto `origin`
///
/// Lines that are empty, start with `#` or start with whitespace are skipped.
/// A single unusable link fails the whole playlist.
pub fn parse_playlist(text: &str, origin: &PageOrigin) -> PlayerResult<Vec<PlaylistEntry>> {
    text.lines()
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('#')
                && !line.starts_with(char::is_whitespace)
        })
        .map(|line| origin.rewrite(line).map(PlaylistEntry::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::DEFAULT_PLAYLIST_MIME_TYPES;
    use crate::utils::http_client::{FetchedResource, MockResourceFetcher};
    use tokio_test::{assert_err, assert_ok};
    use tracing_test::traced_test;

    fn origin() -> PageOrigin {
        PageOrigin::parse("http://127.0.0.1:8888/").unwrap()
    }

    fn mime_types() -> Vec<String> {
        DEFAULT_PLAYLIST_MIME_TYPES.iter().map(|s| s.to_string()).collect()
    }

    fn fetcher_with(mock: MockResourceFetcher) -> PlaylistFetcher {
        PlaylistFetcher::new(Arc::new(mock), origin(), &mime_types())
    }

    #[test]
    fn test_parse_skips_comments_blank_and_indented_lines() {
        let text = "#EXTM3U\n\n#EXTINF:123,Artist - Title\n/CHK@a/one.ogg\n  /CHK@a/indented.ogg\n\t\n/CHK@a/two.ogg\r\n";
        let entries = parse_playlist(text, &origin()).unwrap();
        let links: Vec<_> = entries.iter().map(|e| e.as_str()).collect();
        assert_eq!(
            links,
            vec!["http://127.0.0.1:8888/CHK@a/one.ogg", "http://127.0.0.1:8888/CHK@a/two.ogg"]
        );
    }

    #[test]
    fn test_parse_marks_nested_playlists() {
        let entries = parse_playlist("a.ogg\nmore.m3u\nother.m3u8?x=1\n", &origin()).unwrap();
        let nested: Vec<_> = entries.iter().map(|e| e.is_nested_playlist()).collect();
        assert_eq!(nested, vec![false, true, true]);
    }

    #[tokio::test]
    async fn test_fetch_accepts_playlist_mime_types() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchedResource::new("audio/mpegurl; charset=utf-8", "a.ogg\nb.ogg\n")));

        let fetcher = fetcher_with(mock);
        let url = Url::parse("http://127.0.0.1:8888/list.m3u").unwrap();
        let entries = assert_ok!(fetcher.fetch(&url).await);
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_fetch_rejects_other_mime_types() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchedResource::new("text/plain", "a.ogg\n")));

        let fetcher = fetcher_with(mock);
        let url = Url::parse("http://127.0.0.1:8888/list.m3u").unwrap();
        let err = assert_err!(fetcher.fetch(&url).await);
        assert_eq!(
            err,
            PlayerError::invalid_content_type("http://127.0.0.1:8888/list.m3u", "text/plain")
        );
        assert!(logs_contain("but had 'text/plain'"));
    }

    #[tokio::test]
    async fn test_fetch_propagates_network_failure() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(1)
            .returning(|url| Err(PlayerError::network(url, "connection reset")));

        let fetcher = fetcher_with(mock);
        let url = Url::parse("http://127.0.0.1:8888/list.m3u").unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(PlayerError::NetworkFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_fails_on_unusable_link() {
        let mut mock = MockResourceFetcher::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchedResource::new("audio/x-mpegurl", "a.ogg\nmailto:x@example.com\n")));

        let fetcher = fetcher_with(mock);
        let url = Url::parse("http://127.0.0.1:8888/list.m3u").unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(PlayerError::InvalidUrl { .. })
        ));
    }
}
