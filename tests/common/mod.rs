//! Shared fixtures: an in-memory network and service wiring

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use m3u_player::config::Config;
use m3u_player::errors::{PlayerError, PlayerResult};
use m3u_player::player::PlayerServices;
use m3u_player::utils::{FetchedResource, ResourceFetcher};

pub const PAGE: &str = "http://127.0.0.1:8888/";
pub const PLAYLIST_MIME: &str = "audio/x-mpegurl";

/// Serves canned responses keyed by absolute URL and counts requests
#[derive(Default)]
pub struct MockNetwork {
    resources: Mutex<HashMap<String, FetchedResource>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, content_type: &str, body: impl Into<String>) {
        let body: String = body.into();
        self.resources
            .lock()
            .unwrap()
            .insert(url.to_string(), FetchedResource::new(content_type, body));
    }

    pub fn serve_playlist(&self, url: &str, body: impl Into<String>) {
        self.serve(url, PLAYLIST_MIME, body);
    }

    pub fn serve_track(&self, url: &str) {
        self.serve(url, "audio/ogg", format!("OggS {url}"));
    }

    pub fn remove(&self, url: &str) {
        self.resources.lock().unwrap().remove(url);
    }

    pub fn requests(&self, url: &str) -> usize {
        self.requests.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ResourceFetcher for MockNetwork {
    async fn fetch(&self, url: &str) -> PlayerResult<FetchedResource> {
        *self.requests.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.resources
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| PlayerError::network(url, "HTTP 404 Not Found"))
    }
}

pub fn link(path: &str) -> String {
    format!("{PAGE}{path}")
}

pub fn services(network: &Arc<MockNetwork>) -> Arc<PlayerServices> {
    services_with(network, Config::default())
}

pub fn services_with(network: &Arc<MockNetwork>, mut config: Config) -> Arc<PlayerServices> {
    config.page.url = PAGE.to_string();
    PlayerServices::from_config(&config, network.clone()).unwrap()
}
