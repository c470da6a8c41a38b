use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{PlayerError, PlayerResult};
use crate::utils::url::UrlUtils;

/// A fetched resource: its declared MIME type and raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// Content-Type essence, lower-cased, parameters removed
    pub mime_type: String,
    pub body: Bytes,
}

impl FetchedResource {
    pub fn new<M: AsRef<str>, B: Into<Bytes>>(content_type: M, body: B) -> Self {
        Self {
            mime_type: mime_essence(content_type.as_ref()),
            body: body.into(),
        }
    }
}

/// Reduce a Content-Type header value to its `type/subtype` part
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Network seam for everything the player downloads
///
/// Playlists and track payloads both go through this trait, so the whole
/// player can run against an in-memory network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch `url`, failing with [`PlayerError::NetworkFailure`] on transport
    /// errors and non-success statuses
    async fn fetch(&self, url: &str) -> PlayerResult<FetchedResource>;
}

/// Default implementation of ResourceFetcher using reqwest
pub struct HttpResourceFetcher {
    client: Client,
}

impl HttpResourceFetcher {
    /// Create new HTTP client with only a connection timeout
    ///
    /// There is no total request timeout: a stalled track download simply
    /// leaves its prefetch slot reserved.
    pub fn with_connection_timeout(connect_timeout: Duration, user_agent: &str) -> PlayerResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| PlayerError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &HttpConfig) -> PlayerResult<Self> {
        Self::with_connection_timeout(config.connect_timeout()?, &config.user_agent)
    }

    async fn process_response(response: Response, url: &str) -> PlayerResult<FetchedResource> {
        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::network(
                UrlUtils::obfuscate_credentials(url),
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await.map_err(|e| {
            PlayerError::network(
                UrlUtils::obfuscate_credentials(url),
                format!("Failed to read response: {e}"),
            )
        })?;

        debug!(
            "Fetched {} bytes ({}) from {}",
            body.len(),
            content_type,
            UrlUtils::obfuscate_credentials(url)
        );

        Ok(FetchedResource::new(content_type, body))
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch(&self, url: &str) -> PlayerResult<FetchedResource> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let obfuscated_msg = UrlUtils::obfuscate_credentials(&e.to_string());
            PlayerError::network(UrlUtils::obfuscate_credentials(url), obfuscated_msg)
        })?;

        Self::process_response(response, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("audio/x-mpegurl", "audio/x-mpegurl")]
    #[case("Audio/X-MpegURL; charset=utf-8", "audio/x-mpegurl")]
    #[case("  application/vnd.apple.mpegurl ;q=1", "application/vnd.apple.mpegurl")]
    #[case("", "")]
    fn test_mime_essence(#[case] header: &str, #[case] expected: &str) {
        assert_eq!(mime_essence(header), expected);
    }

    #[test]
    fn test_client_from_default_config() {
        assert!(HttpResourceFetcher::from_config(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let fetcher = HttpResourceFetcher::with_connection_timeout(
            Duration::from_millis(200),
            "m3u-player-test",
        )
        .unwrap();

        // Port 9 (discard) on localhost is closed on any sane test machine
        let result = fetcher.fetch("http://127.0.0.1:9/list.m3u").await;
        assert!(matches!(result, Err(PlayerError::NetworkFailure { .. })));
    }
}
