use super::schema::{Config, FINAL_GAMEWEEK};

/// Fastest auto-refresh allowed, to stay well inside the API's rate limits
const MIN_REFRESH_SECS: u64 = 10;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.league_id == 0 {
        errors.push("league_id: must be a positive league id".to_string());
    }

    if !(1..=FINAL_GAMEWEEK).contains(&config.target_gameweek) {
        errors.push(format!(
            "target_gameweek: must be between 1 and {}, got {}",
            FINAL_GAMEWEEK, config.target_gameweek
        ));
    }

    if config.trend_window == 0 {
        errors.push("trend_window: must be at least 1".to_string());
    }

    if let Err(e) = config.cache_ttl() {
        errors.push(format!(
            "cache_ttl: invalid duration '{}' - {}",
            config.cache_ttl, e
        ));
    }

    if config.auto_refresh_interval < MIN_REFRESH_SECS {
        errors.push(format!(
            "auto_refresh_interval: must be at least {} seconds",
            MIN_REFRESH_SECS
        ));
    }

    for (i, name) in config.exclude.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(format!("exclude[{}]: name must not be empty", i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
