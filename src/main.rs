use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use fpl_net::config::{self, Config};
use fpl_net::error::LeagueError;
use fpl_net::fetch::{fetch_league, FetchOptions, LeagueSnapshot};
use fpl_net::fpl::{self, CacheConfig, CachedClient};
use fpl_net::output;

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_DATA: i32 = 5;

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    /// Current net score table (default if no subcommand)
    Standings,
    /// Net scores per gameweek
    History {
        /// Show a single gameweek instead of the recent matrix
        #[arg(long = "gw")]
        gameweek: Option<u32>,
    },
    /// Project final totals and net scores
    Project {
        /// Gameweek to project to (defaults to the configured target)
        #[arg(long = "target-gw")]
        target_gameweek: Option<u32>,
    },
    /// Per-manager points statistics
    Form,
    /// Interactive dashboard
    Tui,
    /// Open a manager's FPL page by their standings index
    Open {
        /// Index number of the manager (1-based, as shown in standings)
        index: usize,
    },
    /// Write a config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fpl-net")]
#[command(about = "Zero-sum net scores for a Fantasy Premier League classic league", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/fpl-net/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// League id, overriding the config file
    #[arg(long, global = true)]
    league: Option<u64>,

    /// Manager to leave out of the tables; repeat for several. Replaces the
    /// configured list.
    #[arg(long = "exclude", value_name = "NAME", global = true)]
    exclude: Vec<String>,

    /// Skip the response cache for this run
    #[arg(long, global = true)]
    no_cache: bool,

    /// Delete cached responses before running
    #[arg(long, global = true)]
    clear_cache: bool,

    /// Output format for non-interactive commands
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Apply command-line overrides on top of the file config
fn apply_overrides(mut config: Config, cli: &Cli, command: &Commands) -> Config {
    if let Some(league) = cli.league {
        config.league_id = league;
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
    }
    if let Commands::Project {
        target_gameweek: Some(gw),
    } = command
    {
        config.target_gameweek = *gw;
    }
    config
}

/// Exit code for a failed fetch: too few members is a data problem,
/// anything else came from the network
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<LeagueError>().is_some() {
        EXIT_DATA
    } else {
        EXIT_NETWORK
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Failed to encode JSON: {}", e);
            std::process::exit(EXIT_DATA);
        }
    }
}

fn render(snapshot: &LeagueSnapshot, command: &Commands, format: OutputFormat) {
    let use_colors = output::should_use_colors();

    match (command, format) {
        (Commands::History { gameweek }, OutputFormat::Table) => {
            println!("{}", output::format_history_table(snapshot, *gameweek, use_colors));
        }
        (Commands::History { gameweek }, OutputFormat::Tsv) => {
            println!("{}", output::format_history_tsv(snapshot, *gameweek));
        }
        (Commands::History { gameweek }, OutputFormat::Json) => {
            let settlements: Vec<_> = snapshot
                .settlements
                .iter()
                .filter(|s| gameweek.map_or(true, |gw| s.gameweek == gw))
                .collect();
            print_json(&json!({
                "league_id": snapshot.league_id,
                "settlements": settlements,
            }));
        }
        (Commands::Project { .. }, OutputFormat::Table) => {
            println!("Projected to GW{}", snapshot.target_gameweek);
            println!("{}", output::format_projection_table(&snapshot.projections, use_colors));
        }
        (Commands::Project { .. }, OutputFormat::Tsv) => {
            println!("{}", output::format_projection_tsv(&snapshot.projections));
        }
        (Commands::Project { .. }, OutputFormat::Json) => {
            print_json(&json!({
                "league_id": snapshot.league_id,
                "current_gameweek": snapshot.current_gameweek,
                "target_gameweek": snapshot.target_gameweek,
                "projections": snapshot.projections,
            }));
        }
        (Commands::Form, OutputFormat::Table) => {
            println!("{}", output::format_form_table(&snapshot.form, use_colors));
        }
        (Commands::Form, OutputFormat::Tsv) => {
            println!("{}", output::format_form_tsv(&snapshot.form));
        }
        (Commands::Form, OutputFormat::Json) => {
            print_json(&json!({
                "league_id": snapshot.league_id,
                "form": snapshot.form,
            }));
        }
        (_, OutputFormat::Table) => {
            println!(
                "{}",
                output::format_standings_title(
                    snapshot.league_name.as_deref(),
                    snapshot.current_gameweek,
                    &snapshot.excluded,
                )
            );
            println!("{}", output::format_standings_table(&snapshot.standings, use_colors));
            println!();
            println!("{}", output::format_summary(snapshot.standings.len()));
        }
        (_, OutputFormat::Tsv) => {
            println!("{}", output::format_standings_tsv(&snapshot.standings));
        }
        (_, OutputFormat::Json) => {
            print_json(&json!({
                "league_id": snapshot.league_id,
                "league_name": snapshot.league_name,
                "current_gameweek": snapshot.current_gameweek,
                "standings": snapshot.standings,
                "excluded": snapshot.excluded,
            }));
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    fpl_net::logging::init(cli.verbose);

    let command = cli.command.clone().unwrap_or(Commands::Standings);
    let start_time = Instant::now();

    if let Commands::Init { force } = command {
        match config::init::run_init(cli.config.clone(), force) {
            Ok(path) => {
                println!("Wrote {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    // Load config
    let file_config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let config = apply_overrides(file_config, &cli, &command);

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    debug!(
        league = config.league_id,
        excluded = ?config.exclude,
        target = config.target_gameweek,
        "loaded config"
    );

    if cli.clear_cache {
        match fpl::cache::clear_cache() {
            Ok(()) => info!("cleared response cache"),
            Err(e) => eprintln!("Failed to clear cache: {:#}", e),
        }
    }

    let ttl = match config.cache_ttl() {
        Ok(ttl) => ttl,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let cache_config = CacheConfig {
        enabled: !cli.no_cache,
        ttl,
    };

    let http = match fpl::create_client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {:#}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };
    let client = CachedClient::from_config(http, &cache_config);

    if let Commands::Tui = command {
        let theme = fpl_net::tui::resolve_theme(config.theme);
        let app = fpl_net::tui::App::new_loading(config, fpl_net::tui::ThemeColors::for_theme(theme));
        if let Err(e) = fpl_net::tui::run_tui(app, client).await {
            eprintln!("TUI error: {:#}", e);
            std::process::exit(EXIT_NETWORK);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let options = FetchOptions::from(&config);
    let snapshot = match fetch_league(&client, &options).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    };

    match command {
        Commands::Open { index } => {
            // Validate index bounds (1-based)
            if index < 1 || index > snapshot.standings.len() {
                eprintln!(
                    "Invalid index {}. Must be between 1 and {}.",
                    index,
                    snapshot.standings.len()
                );
                std::process::exit(EXIT_CONFIG);
            }

            let member = &snapshot.standings[index - 1].member;
            if let Err(e) = fpl_net::browser::open_member(member) {
                eprintln!("Failed to open browser: {:#}", e);
                std::process::exit(EXIT_NETWORK);
            }
            println!("Opening {} in browser: {}", member.display_name, member.profile_url());
        }
        _ => render(&snapshot, &command, cli.format),
    }

    info!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
