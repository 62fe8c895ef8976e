use serde::{Deserialize, Serialize};

pub const DEFAULT_LEAGUE_ID: u64 = 1133270;
pub const DEFAULT_EXCLUDED_PLAYER: &str = "Emil Chau";
pub const FINAL_GAMEWEEK: u32 = 38;

/// Contents of `config.yaml`. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Classic league to settle
    #[serde(default = "default_league_id")]
    pub league_id: u64,

    /// Manager names left out of every table (exact, case-sensitive match)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Gameweek the projection runs to
    #[serde(default = "default_target_gameweek")]
    pub target_gameweek: u32,

    /// Trailing gameweeks in the projection trend
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,

    /// How long API responses are reused, as a humantime duration ("1h", "30m")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// Seconds between automatic TUI refreshes
    #[serde(default = "default_auto_refresh_interval")]
    pub auto_refresh_interval: u64,

    #[serde(default)]
    pub theme: ThemeMode,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Auto => "auto",
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

fn default_league_id() -> u64 {
    DEFAULT_LEAGUE_ID
}

fn default_exclude() -> Vec<String> {
    vec![DEFAULT_EXCLUDED_PLAYER.to_string()]
}

fn default_target_gameweek() -> u32 {
    FINAL_GAMEWEEK
}

fn default_trend_window() -> usize {
    crate::league::projection::DEFAULT_TREND_WINDOW
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

fn default_auto_refresh_interval() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            league_id: default_league_id(),
            exclude: default_exclude(),
            target_gameweek: default_target_gameweek(),
            trend_window: default_trend_window(),
            cache_ttl: default_cache_ttl(),
            auto_refresh_interval: default_auto_refresh_interval(),
            theme: ThemeMode::default(),
        }
    }
}

impl Config {
    /// Parsed `cache_ttl`
    pub fn cache_ttl(&self) -> Result<std::time::Duration, humantime::DurationError> {
        humantime::parse_duration(&self.cache_ttl)
    }
}
