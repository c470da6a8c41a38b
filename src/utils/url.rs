//! URL utilities for playlist links
//!
//! Every link read from a playlist is user input. Before the player touches
//! it, it is resolved against the page it is embedded in and rewritten to
//! that page's origin, since content security policy forbids loading from
//! any other host.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::errors::{PlayerError, PlayerResult};

/// File suffixes that mark a link as another playlist
const PLAYLIST_SUFFIXES: [&str; 2] = [".m3u", ".m3u8"];

static SENSITIVE_QUERY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:username|password|user|pass|pwd|passwd|key|token)=)[^&#]*")
        .expect("static regex is valid")
});

/// URL utilities for consistent link handling
pub struct UrlUtils;

impl UrlUtils {
    /// Drop query and fragment; used for cache keys, titles and suffix checks
    ///
    /// # Examples
    ///
    /// ```rust
    /// use m3u_player::utils::url::UrlUtils;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://127.0.0.1:8888/USK@abc/list.m3u?type=audio#top").unwrap();
    /// assert_eq!(
    ///     UrlUtils::strip_parameters(&url).as_str(),
    ///     "http://127.0.0.1:8888/USK@abc/list.m3u"
    /// );
    /// ```
    pub fn strip_parameters(url: &Url) -> Url {
        let mut stripped = url.clone();
        stripped.set_query(None);
        stripped.set_fragment(None);
        stripped
    }

    /// Whether the link points at another playlist, judged by its suffix
    pub fn is_playlist(url: &Url) -> bool {
        let path = Self::strip_parameters(url).path().to_ascii_lowercase();
        PLAYLIST_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
    }

    /// Whether the link is an in-memory object reference
    pub fn is_blob(url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| u.scheme() == "blob")
    }

    /// Mask credentials in a URL so it can be logged
    pub fn obfuscate_credentials(url: &str) -> String {
        let masked = match Url::parse(url) {
            Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
                let _ = parsed.set_username("****");
                let _ = parsed.set_password(Some("****"));
                parsed.to_string()
            }
            _ => url.to_string(),
        };

        SENSITIVE_QUERY_PARAM
            .replace_all(&masked, "${1}****")
            .into_owned()
    }
}

/// The origin of the page hosting the player
///
/// Links are resolved relative to [`PageOrigin::page_url`] and then forced
/// onto its host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    page: Url,
}

impl PageOrigin {
    pub fn new(page: Url) -> Self {
        Self { page }
    }

    pub fn parse(page: &str) -> PlayerResult<Self> {
        Url::parse(page)
            .map(Self::new)
            .map_err(|e| PlayerError::invalid_url(page, e.to_string()))
    }

    pub fn page_url(&self) -> &Url {
        &self.page
    }

    pub fn is_secure(&self) -> bool {
        self.page.scheme() == "https"
    }

    /// Resolve `link` against the page and rewrite it onto the page origin
    ///
    /// `blob:` links keep their host. An `http` link is upgraded to `https`
    /// when the page itself is served securely.
    pub fn rewrite(&self, link: &str) -> PlayerResult<Url> {
        let link = link.trim();
        let mut url = self
            .page
            .join(link)
            .map_err(|e| PlayerError::invalid_url(link, e.to_string()))?;

        if url.scheme() != "blob" {
            url.set_host(self.page.host_str())
                .map_err(|e| PlayerError::invalid_url(link, e.to_string()))?;
            url.set_port(self.page.port())
                .map_err(|_| PlayerError::invalid_url(link, "scheme cannot carry a port"))?;
        }

        if url.scheme() == "http" && self.is_secure() {
            url.set_scheme("https")
                .map_err(|_| PlayerError::invalid_url(link, "cannot upgrade to https"))?;
        }

        Ok(url)
    }
}
