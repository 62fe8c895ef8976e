use std::future::Future;
use tracing::debug;

use super::cache::{CacheConfig, Clock, ResponseCache, SystemClock};
use super::client::{decode_history, decode_standings, FplClient};
use super::types::LeagueStandings;
use crate::error::FetchError;
use crate::league::{MemberId, PeriodScore};

/// The two reads the league view is built from
pub trait LeagueApi: Send + Sync {
    fn standings(
        &self,
        league_id: u64,
    ) -> impl Future<Output = Result<LeagueStandings, FetchError>> + Send;

    fn history(
        &self,
        entry_id: MemberId,
    ) -> impl Future<Output = Result<Vec<PeriodScore>, FetchError>> + Send;
}

/// [`FplClient`] behind a TTL response cache
#[derive(Clone)]
pub struct CachedClient<C: Clock = SystemClock> {
    client: FplClient,
    cache: Option<ResponseCache<C>>,
}

impl CachedClient<SystemClock> {
    /// Build from a cache config; the cache is disk-backed unless disabled
    pub fn from_config(client: FplClient, config: &CacheConfig) -> Self {
        let cache = config.enabled.then(|| {
            ResponseCache::new(config.ttl, SystemClock).with_disk(super::cache::get_cache_path())
        });
        Self { client, cache }
    }
}

impl<C: Clock + Clone> CachedClient<C> {
    pub fn new(client: FplClient, cache: Option<ResponseCache<C>>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> Option<&ResponseCache<C>> {
        self.cache.as_ref()
    }

    /// Cached body for `key`, or a fresh GET of `url`.
    ///
    /// Also returns whether the body came from the network.
    async fn body(&self, key: &str, url: &str) -> Result<(Vec<u8>, bool), FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(key) {
                debug!(key, "cache hit");
                return Ok((body, false));
            }
        }
        let body = self.client.get_bytes(url).await?;
        Ok((body, true))
    }

    /// Cache a fresh body that decoded; forget a cached one that didn't
    fn keep_if_decoded<T>(
        &self,
        key: &str,
        body: Vec<u8>,
        fresh: bool,
        decoded: Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        if let Some(cache) = &self.cache {
            match &decoded {
                Ok(_) if fresh => cache.put(key, body),
                Err(_) if !fresh => {
                    debug!(key, "dropping undecodable cache entry");
                    cache.invalidate(key);
                }
                _ => {}
            }
        }
        decoded
    }
}

impl<C: Clock + Clone> LeagueApi for CachedClient<C> {
    fn standings(
        &self,
        league_id: u64,
    ) -> impl Future<Output = Result<LeagueStandings, FetchError>> + Send {
        async move {
            let url = self.client.standings_url(league_id);
            let league = league_id.to_string();
            let key = ResponseCache::<C>::key("standings", &[("league", league.as_str())]);

            let (body, fresh) = self.body(&key, &url).await?;
            let decoded = decode_standings(&url, &body);
            self.keep_if_decoded(&key, body, fresh, decoded)
        }
    }

    fn history(
        &self,
        entry_id: MemberId,
    ) -> impl Future<Output = Result<Vec<PeriodScore>, FetchError>> + Send {
        async move {
            let url = self.client.history_url(entry_id);
            let entry = entry_id.to_string();
            let key = ResponseCache::<C>::key("history", &[("entry", entry.as_str())]);

            let (body, fresh) = self.body(&key, &url).await?;
            let decoded = decode_history(&url, entry_id, &body);
            self.keep_if_decoded(&key, body, fresh, decoded)
        }
    }
}
