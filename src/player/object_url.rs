use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::prefetch::TrackPayload;
use crate::utils::url::PageOrigin;

/// Transient `blob:` references to in-memory track payloads
///
/// Every reference handed to a media element must be revoked once the element
/// moves on, otherwise the payload stays alive for the lifetime of the page.
pub struct ObjectUrlRegistry {
    origin: String,
    objects: Mutex<HashMap<String, TrackPayload>>,
}

impl ObjectUrlRegistry {
    pub fn new(origin: &PageOrigin) -> Self {
        Self {
            origin: origin.page_url().origin().ascii_serialization(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    fn objects(&self) -> std::sync::MutexGuard<'_, HashMap<String, TrackPayload>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, payload: TrackPayload) -> String {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        debug!("Created object URL {} ({} bytes)", url, payload.bytes.len());
        self.objects().insert(url.clone(), payload);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<TrackPayload> {
        self.objects().get(url).cloned()
    }

    pub fn revoke(&self, url: &str) -> bool {
        let revoked = self.objects().remove(url).is_some();
        if revoked {
            debug!("Revoked object URL {}", url);
        }
        revoked
    }

    /// Number of references still alive
    pub fn live_count(&self) -> usize {
        self.objects().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_create_resolve_revoke() {
        let registry = ObjectUrlRegistry::new(&PageOrigin::parse("http://127.0.0.1:8888/USK@x/").unwrap());
        let payload = TrackPayload {
            bytes: Bytes::from_static(b"OggS"),
            mime_type: "audio/ogg".to_string(),
        };

        let url = registry.create(payload.clone());
        assert!(url.starts_with("blob:http://127.0.0.1:8888/"));
        assert_eq!(registry.resolve(&url), Some(payload));
        assert_eq!(registry.live_count(), 1);

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert_eq!(registry.live_count(), 0);
    }
}
