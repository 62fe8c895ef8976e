use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use super::schema::{Config, FINAL_GAMEWEEK};
use super::{get_config_path, validate_config};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Render a config as commented YAML.
///
/// Strings are written as JSON string literals, which YAML reads back as
/// double-quoted scalars, so names with quotes or colons survive.
pub fn render_config(config: &Config) -> String {
    let quote = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s));

    let mut out = String::new();
    out.push_str("# fpl-net configuration\n\n");
    out.push_str("# Classic league id, from the league URL on fantasy.premierleague.com\n");
    out.push_str(&format!("league_id: {}\n\n", config.league_id));

    out.push_str("# Managers left out of every table (exact, case-sensitive)\n");
    if config.exclude.is_empty() {
        out.push_str("exclude: []\n\n");
    } else {
        out.push_str("exclude:\n");
        for name in &config.exclude {
            out.push_str(&format!("  - {}\n", quote(name)));
        }
        out.push('\n');
    }

    out.push_str("# Gameweek the projection runs to\n");
    out.push_str(&format!("target_gameweek: {}\n\n", config.target_gameweek));
    out.push_str("# Trailing gameweeks weighted into the projection trend\n");
    out.push_str(&format!("trend_window: {}\n\n", config.trend_window));
    out.push_str("# How long API responses are reused\n");
    out.push_str(&format!("cache_ttl: {}\n\n", quote(&config.cache_ttl)));
    out.push_str("# Seconds between dashboard refreshes\n");
    out.push_str(&format!("auto_refresh_interval: {}\n\n", config.auto_refresh_interval));
    out.push_str("# auto | dark | light\n");
    out.push_str(&format!("theme: {}\n", config.theme.as_str()));
    out
}

/// Write `config` to `path` atomically, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(render_config(config).as_bytes())
        .context("Failed to write config")?;
    file.commit()
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Ask for the league settings, falling back to defaults on empty input
fn prompt_config() -> Result<Config> {
    let defaults = Config::default();

    println!();
    println!("fpl-net configuration");
    println!("=====================");
    println!();
    println!("The league id is the number in the league URL, e.g.");
    println!("  https://fantasy.premierleague.com/leagues/1133270/standings/c");

    let league_id = loop {
        let input = prompt_with_default("League id", &defaults.league_id.to_string())?;
        match input.parse::<u64>() {
            Ok(id) if id > 0 => break id,
            _ => println!("  Invalid: must be a positive number. Try again."),
        }
    };

    println!();
    let exclude = if prompt_yes_no(
        &format!("Exclude \"{}\" from the tables?", defaults.exclude.join(", ")),
        true,
    )? {
        defaults.exclude.clone()
    } else {
        let input = prompt("Managers to exclude, comma separated (empty for none): ")?;
        input
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    println!();
    let target_gameweek = loop {
        let input = prompt_with_default("Project to gameweek", &defaults.target_gameweek.to_string())?;
        match input.parse::<u32>() {
            Ok(gw) if (1..=FINAL_GAMEWEEK).contains(&gw) => break gw,
            _ => println!("  Invalid: must be between 1 and {}. Try again.", FINAL_GAMEWEEK),
        }
    };

    Ok(Config {
        league_id,
        exclude,
        target_gameweek,
        ..defaults
    })
}

/// Create a config file, interactively when stdin is a terminal.
///
/// Returns the path written.
pub fn run_init(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let config_path = path.unwrap_or_else(get_config_path);

    let config = if std::io::stdin().is_terminal() {
        prompt_config()?
    } else {
        Config::default()
    };

    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Refusing to write invalid config: {}", errors.join("; "));
    }

    write_config(&config_path, &config, force)?;
    Ok(config_path)
}
