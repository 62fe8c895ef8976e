pub mod api;
pub mod cache;
pub mod client;
pub mod types;

pub use api::{CachedClient, LeagueApi};
pub use cache::{CacheConfig, ResponseCache};
pub use client::{create_client, FplClient};
pub use types::LeagueStandings;
