use anyhow::{Context, Result};
use tracing::debug;

use super::types::{HistoryResponse, LeagueStandings, StandingsResponse};
use crate::error::FetchError;
use crate::league::{MemberId, PeriodScore};

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";

// The API rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0";

/// Thin HTTP client for the public FPL endpoints
#[derive(Clone, Debug)]
pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
}

/// Create an FPL API client
pub fn create_client() -> Result<FplClient> {
    // rustls 0.23+ needs a process-wide crypto provider; Err means one is already set
    let _ = rustls::crypto::ring::default_provider().install_default();

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    Ok(FplClient {
        http,
        base_url: DEFAULT_BASE_URL.to_string(),
    })
}

impl FplClient {
    /// Point the client at another host, e.g. a local mock
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn standings_url(&self, league_id: u64) -> String {
        format!("{}/leagues-classic/{}/standings/", self.base_url, league_id)
    }

    pub fn history_url(&self, entry_id: MemberId) -> String {
        format!("{}/entry/{}/history/", self.base_url, entry_id)
    }

    /// GET `url` and return the body of a 2xx response
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

        Ok(body.to_vec())
    }
}

/// Decode a classic league standings payload
pub fn decode_standings(url: &str, body: &[u8]) -> Result<LeagueStandings, FetchError> {
    let response: StandingsResponse =
        serde_json::from_slice(body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
    Ok(response.into())
}

/// Decode an entry history payload into periods ordered by gameweek
pub fn decode_history(
    url: &str,
    member_id: MemberId,
    body: &[u8],
) -> Result<Vec<PeriodScore>, FetchError> {
    let response: HistoryResponse =
        serde_json::from_slice(body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;

    let mut periods: Vec<PeriodScore> = response
        .current
        .into_iter()
        .map(|event| event.into_period(member_id))
        .collect();
    periods.sort_by_key(|p| p.gameweek);

    Ok(periods)
}
