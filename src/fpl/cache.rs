use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Default lifetime of a cached API response
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Configuration for HTTP response caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Source of "now" for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[cfg(test)]
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Get the platform-appropriate cache directory for fpl-net
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("fpl-net/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/fpl-net/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the HTTP cache directory
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Serialized form of a response, in memory and on disk
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    body: Vec<u8>,
}

/// Time-bounded cache of raw response bodies keyed by endpoint and parameters.
///
/// Lookups go to memory first, then to the optional cacache directory. An
/// entry older than the TTL is a miss wherever it is found.
#[derive(Clone)]
pub struct ResponseCache<C: Clock = SystemClock> {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
    disk_path: Option<PathBuf>,
    ttl: chrono::Duration,
    clock: C,
}

impl<C: Clock> ResponseCache<C> {
    /// In-memory cache only
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            disk_path: None,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
            clock,
        }
    }

    /// Also persist entries under `path` so they survive between runs
    pub fn with_disk(mut self, path: PathBuf) -> Self {
        self.disk_path = Some(path);
        self
    }

    /// Stable key for an endpoint and its parameters, e.g. `standings?league=1133270`
    pub fn key(endpoint: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return endpoint.to_string();
        }
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", endpoint, query)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.fetched_at < self.ttl
    }

    /// Fresh body for `key`, if any
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        {
            let data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = data.get(key) {
                if self.is_fresh(entry) {
                    return Some(entry.body.clone());
                }
            }
        }

        self.load_from_disk(key)
    }

    /// Store a body fetched now
    pub fn put(&self, key: &str, body: Vec<u8>) {
        let entry = CacheEntry {
            fetched_at: self.clock.now(),
            body,
        };

        if let Some(path) = &self.disk_path {
            // Disk write is best-effort; the memory copy still serves this run
            if let Ok(serialized) = serde_json::to_vec(&entry) {
                if let Err(e) = cacache::write_sync(path, key, &serialized) {
                    debug!(key, error = %e, "failed to persist cache entry");
                }
            }
        }

        let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.to_string(), entry);
    }

    /// Drop in-memory entries. Fresh disk entries are still served.
    pub fn clear_memory(&self) {
        let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        data.clear();
    }

    /// Drop every entry in memory and on disk so the next lookup of any key
    /// goes to the network
    pub fn clear(&self) {
        self.clear_memory();
        if let Some(path) = &self.disk_path {
            if let Err(e) = cacache::clear_sync(path) {
                debug!(error = %e, "failed to clear disk cache");
            }
        }
    }

    /// Forget a single key everywhere
    pub fn invalidate(&self, key: &str) {
        {
            let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            data.remove(key);
        }
        if let Some(path) = &self.disk_path {
            let _ = cacache::remove_sync(path, key);
        }
    }

    fn load_from_disk(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.disk_path.as_ref()?;
        let bytes = cacache::read_sync(path, key).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).ok()?;

        if !self.is_fresh(&entry) {
            return None;
        }

        // Populate in-memory cache for subsequent hits
        let body = entry.body.clone();
        let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.to_string(), entry);
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 8, 15, 18, 0, 0).unwrap())
    }

    #[test]
    fn test_key_format() {
        assert_eq!(ResponseCache::<SystemClock>::key("standings", &[]), "standings");
        assert_eq!(
            ResponseCache::<SystemClock>::key("history", &[("entry", "42")]),
            "history?entry=42"
        );
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = clock();
        let cache = ResponseCache::new(Duration::from_secs(3600), clock.clone());
        cache.put("standings?league=1", b"{}".to_vec());

        clock.advance(Duration::from_secs(3599));
        assert_eq!(cache.get("standings?league=1"), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_expires_after_ttl() {
        let clock = clock();
        let cache = ResponseCache::new(Duration::from_secs(3600), clock.clone());
        cache.put("standings?league=1", b"{}".to_vec());

        clock.advance(Duration::from_secs(3600));
        assert_eq!(cache.get("standings?league=1"), None);
    }

    #[test]
    fn test_put_is_idempotent() {
        let cache = ResponseCache::new(Duration::from_secs(60), clock());
        cache.put("k", b"a".to_vec());
        cache.put("k", b"a".to_vec());
        assert_eq!(cache.get("k"), Some(b"a".to_vec()));
    }

    #[test]
    fn test_clear_memory() {
        let cache = ResponseCache::new(Duration::from_secs(60), clock());
        cache.put("k", b"a".to_vec());
        cache.clear_memory();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear_bypasses_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Duration::from_secs(3600), clock())
            .with_disk(dir.path().to_path_buf());
        cache.put("k", b"v".to_vec());

        cache.clear_memory();
        assert_eq!(cache.get("k"), Some(b"v".to_vec()));

        cache.clear();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_disk_entry_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();

        let first = ResponseCache::new(Duration::from_secs(3600), clock.clone())
            .with_disk(dir.path().to_path_buf());
        first.put("history?entry=7", b"[1,2,3]".to_vec());

        let second = ResponseCache::new(Duration::from_secs(3600), clock.clone())
            .with_disk(dir.path().to_path_buf());
        assert_eq!(second.get("history?entry=7"), Some(b"[1,2,3]".to_vec()));
    }

    #[test]
    fn test_stale_disk_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();

        let cache = ResponseCache::new(Duration::from_secs(3600), clock.clone())
            .with_disk(dir.path().to_path_buf());
        cache.put("k", b"old".to_vec());
        cache.clear_memory();

        clock.advance(Duration::from_secs(7200));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_invalidate_removes_disk_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Duration::from_secs(3600), clock())
            .with_disk(dir.path().to_path_buf());
        cache.put("k", b"v".to_vec());
        cache.invalidate("k");
        assert_eq!(cache.get("k"), None);
    }
}
