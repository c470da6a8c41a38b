use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::errors::{PlayerError, PlayerResult};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub prefetch: PrefetchConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// The page the player is embedded in; every link is rewritten to its origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_page_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Maximum number of entries in a flattened playlist
    #[serde(default = "default_max_playlist_length")]
    pub max_length: usize,
    /// Content types a resource must be served with to be parsed as a playlist
    #[serde(default = "default_playlist_mime_types")]
    pub mime_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Maximum number of prefetched tracks kept in memory
    #[serde(default = "default_prefetch_capacity")]
    pub capacity: usize,
    /// Number of upcoming tracks prefetched after each source change
    #[serde(default = "default_prefetch_lookahead")]
    pub lookahead: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}

fn default_max_playlist_length() -> usize {
    DEFAULT_MAX_PLAYLIST_LENGTH
}

fn default_playlist_mime_types() -> Vec<String> {
    DEFAULT_PLAYLIST_MIME_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_prefetch_capacity() -> usize {
    DEFAULT_PREFETCH_CAPACITY
}

fn default_prefetch_lookahead() -> usize {
    DEFAULT_PREFETCH_LOOKAHEAD
}

fn default_connect_timeout() -> String {
    DEFAULT_CONNECT_TIMEOUT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: default_page_url(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_playlist_length(),
            mime_types: default_playlist_mime_types(),
        }
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            capacity: default_prefetch_capacity(),
            lookahead: default_prefetch_lookahead(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> PlayerResult<Duration> {
        humantime::parse_duration(&self.connect_timeout).map_err(|e| {
            PlayerError::configuration(format!(
                "invalid http.connect_timeout '{}': {e}",
                self.connect_timeout
            ))
        })
    }
}

impl Config {
    /// Layer the defaults, an optional TOML file and `M3U_PLAYER_*` variables
    ///
    /// Nested keys use a double underscore, e.g. `M3U_PLAYER_PREFETCH__CAPACITY`.
    pub fn load<P: AsRef<Path>>(config_file: Option<P>) -> PlayerResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = config_file {
            let path = path.as_ref();
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            } else {
                debug!("Configuration file {} not found, using defaults", path.display());
            }
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| PlayerError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_str(contents: &str) -> PlayerResult<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| PlayerError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        self.page_url()?;
        if self.playlist.max_length == 0 {
            return Err(PlayerError::configuration(
                "playlist.max_length must be greater than zero",
            ));
        }
        if self.playlist.mime_types.is_empty() {
            return Err(PlayerError::configuration(
                "playlist.mime_types must list at least one content type",
            ));
        }
        if self.prefetch.capacity == 0 {
            return Err(PlayerError::configuration(
                "prefetch.capacity must be greater than zero",
            ));
        }
        self.http.connect_timeout()?;
        Ok(())
    }

    pub fn page_url(&self) -> PlayerResult<Url> {
        Url::parse(&self.page.url).map_err(|e| {
            PlayerError::configuration(format!("invalid page.url '{}': {e}", self.page.url))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playlist.max_length, 1000);
        assert_eq!(config.prefetch.capacity, 10);
        assert_eq!(config.prefetch.lookahead, 3);
        assert_eq!(config.playlist.mime_types.len(), 5);
        assert_eq!(config.http.connect_timeout().unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::load_from_str(
            r#"
            [page]
            url = "https://proxy.example:4443/"

            [prefetch]
            capacity = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.page.url, "https://proxy.example:4443/");
        assert_eq!(config.prefetch.capacity, 4);
        assert_eq!(config.prefetch.lookahead, DEFAULT_PREFETCH_LOOKAHEAD);
        assert_eq!(config.playlist.max_length, DEFAULT_MAX_PLAYLIST_LENGTH);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.prefetch.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(PlayerError::Configuration { .. })
        ));

        let mut config = Config::default();
        config.http.connect_timeout = "soon".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.page.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[playlist]\nmax_length = 50").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.playlist.max_length, 50);
        assert_eq!(config.page.url, DEFAULT_PAGE_URL);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/m3u-player.toml")).unwrap();
        assert_eq!(config.prefetch.capacity, DEFAULT_PREFETCH_CAPACITY);
    }
}
