use thiserror::Error;

/// Failure talking to the FPL API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP 429 or 503: the API is throttling or down for the gameweek update
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchError::Status { status: 429 | 503, .. })
    }
}

/// The data fetched cannot be settled
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeagueError {
    #[error("insufficient data: {found} member(s) left after exclusions, at least 2 needed")]
    InsufficientMembers { found: usize },

    #[error("no gameweek history available yet")]
    NoHistory,
}
