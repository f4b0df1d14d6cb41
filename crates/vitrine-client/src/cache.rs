//! Short-lived memo of GET responses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::response::ApiResponse;

/// How a single request interacts with the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CacheMode {
    /// May be served from and stored under `key`.
    Shared { key: String },
    /// Unique key; never read or written.
    Bypass { key: String },
    /// Not cacheable (non-GET).
    Off,
}

impl CacheMode {
    pub(crate) fn key(&self) -> Option<&str> {
        match self {
            CacheMode::Shared { key } | CacheMode::Bypass { key } => Some(key),
            CacheMode::Off => None,
        }
    }
}

/// TTL cache keyed by method and full URL. A TTL of `None` disables storage.
///
/// Entries belong to the access token generation they were fetched under;
/// anonymous requests use `None`.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Option<Duration>,
    owner: Mutex<Option<u64>>,
    entries: Mutex<HashMap<String, (Instant, ApiResponse)>>,
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            owner: Mutex::new(None),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Switch to `owner`, dropping every entry when it differs from the last.
    pub(crate) fn scope_to(&self, owner: Option<u64>) -> bool {
        let mut current = self.owner.lock();
        if *current == owner {
            return false;
        }
        *current = owner;
        self.entries.lock().clear();
        true
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub(crate) fn get(&self, mode: &CacheMode) -> Option<ApiResponse> {
        let CacheMode::Shared { key } = mode else {
            return None;
        };
        let ttl = self.ttl?;

        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((stored, response)) if stored.elapsed() < ttl => Some(response.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn put(&self, mode: &CacheMode, response: &ApiResponse) {
        let CacheMode::Shared { key } = mode else {
            return;
        };
        if self.ttl.is_none() {
            return;
        }
        self.entries
            .lock()
            .insert(key.clone(), (Instant::now(), response.clone()));
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn shared(key: &str) -> CacheMode {
        CacheMode::Shared {
            key: key.to_string(),
        }
    }

    #[test]
    fn test_shared_entries_are_served() {
        let cache = ResponseCache::new(Some(Duration::from_secs(60)));
        let response = ApiResponse::new(StatusCode::OK, "[1,2]");

        cache.put(&shared("GET /tags/"), &response);
        let hit = cache.get(&shared("GET /tags/")).unwrap();
        assert_eq!(hit.text(), "[1,2]");
        assert!(cache.get(&shared("GET /brands/")).is_none());
    }

    #[test]
    fn test_bypass_never_touches_cache() {
        let cache = ResponseCache::new(Some(Duration::from_secs(60)));
        let bypass = CacheMode::Bypass {
            key: "GET /tags/".to_string(),
        };
        cache.put(&shared("GET /tags/"), &ApiResponse::new(StatusCode::OK, "old"));

        assert!(cache.get(&bypass).is_none());
        cache.put(&bypass, &ApiResponse::new(StatusCode::OK, "new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&shared("GET /tags/")).unwrap().text(), "old");
    }

    #[test]
    fn test_zero_ttl_stores_nothing() {
        let cache = ResponseCache::new(None);
        cache.put(&shared("GET /tags/"), &ApiResponse::new(StatusCode::OK, "x"));
        assert!(cache.is_empty());
        assert!(cache.get(&shared("GET /tags/")).is_none());
    }

    #[test]
    fn test_changing_owner_drops_entries() {
        let cache = ResponseCache::new(Some(Duration::from_secs(60)));
        assert!(cache.scope_to(Some(1)));
        cache.put(&shared("GET /secret/"), &ApiResponse::new(StatusCode::OK, "x"));

        assert!(!cache.scope_to(Some(1)));
        assert_eq!(cache.len(), 1);

        assert!(cache.scope_to(None));
        assert!(cache.get(&shared("GET /secret/")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = ResponseCache::new(Some(Duration::from_millis(1)));
        cache.put(&shared("GET /tags/"), &ApiResponse::new(StatusCode::OK, "x"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&shared("GET /tags/")).is_none());
        assert!(cache.is_empty());
    }
}
