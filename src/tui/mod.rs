pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, Theme, ThemeColors};

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::fetch::{fetch_league, FetchOptions, LeagueSnapshot};
use crate::fpl::CachedClient;
use event::{Event, EventHandler};

/// A refresh that takes longer than this is abandoned
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const TICK_RATE: Duration = Duration::from_millis(250);
/// Auto-refresh waits this long after the last keypress
const INTERACTION_GRACE: Duration = Duration::from_secs(10);

type FetchTask = JoinHandle<Result<Result<LeagueSnapshot>, tokio::time::error::Elapsed>>;

fn spawn_fetch(client: &CachedClient, options: &FetchOptions) -> FetchTask {
    let client = client.clone();
    let options = options.clone();
    tokio::spawn(async move {
        tokio::time::timeout(FETCH_TIMEOUT, fetch_league(&client, &options)).await
    })
}

pub async fn run_tui(mut app: App, client: CachedClient) -> Result<()> {
    // Buffer log output while the TUI owns the terminal
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let refresh_interval = Duration::from_secs(app.config.auto_refresh_interval);
    let mut events = EventHandler::new(TICK_RATE, refresh_interval);

    let options = FetchOptions::from(&app.config);
    let mut pending_fetch: Option<FetchTask> = Some(spawn_fetch(&client, &options));
    app.is_loading = true;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh => app.needs_refresh = true,
            Event::Resize => {}
        }

        // Pick up a finished fetch; failures keep the last good snapshot
        if let Some(handle) = pending_fetch.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(Ok(snapshot))) => app.update_snapshot(snapshot),
                Ok(Ok(Err(e))) => {
                    let error = format!("{:#}", e);
                    warn!(error = %error, "refresh failed");
                    app.refresh_failed(error);
                }
                Ok(Err(_elapsed)) => {
                    warn!(timeout = ?FETCH_TIMEOUT, "refresh timed out");
                    app.refresh_failed(format!(
                        "timed out after {}s, will retry on next refresh",
                        FETCH_TIMEOUT.as_secs()
                    ));
                }
                Err(e) => app.refresh_failed(format!("refresh task stopped: {}", e)),
            }
            app.is_loading = false;
        }

        if app.needs_refresh && pending_fetch.is_none() {
            let is_manual = app.force_refresh;
            let modal_open = app.input_mode != app::InputMode::Normal;
            let recent_interaction = app.last_interaction.elapsed() < INTERACTION_GRACE;

            // Auto-refresh waits for the user to go idle; 'r' always proceeds.
            // When suppressed, needs_refresh stays set and is retried next tick.
            if is_manual || (!modal_open && !recent_interaction) {
                app.needs_refresh = false;

                if is_manual {
                    if let Some(cache) = client.cache() {
                        cache.clear();
                    }
                    app.force_refresh = false;
                }

                debug!(manual = is_manual, "starting refresh");
                pending_fetch = Some(spawn_fetch(&client, &options));
                app.is_loading = true;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    ratatui::restore();

    if let Some(handle) = pending_fetch {
        handle.abort();
    }

    // Flush buffered log lines now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        app::InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.should_quit = true
            }

            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            KeyCode::Char('h') | KeyCode::Left => app.step_gameweek(-1),
            KeyCode::Char('l') | KeyCode::Right => app.step_gameweek(1),

            KeyCode::Tab => app.next_view(),
            KeyCode::BackTab => app.previous_view(),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                app.set_view(app::View::ALL[index]);
            }

            KeyCode::Enter | KeyCode::Char('o') => app.open_selected(),
            KeyCode::Char('b') => app.show_detail(),
            KeyCode::Char('r') => app.request_forced_refresh(),
            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::Detail => match key.code {
            KeyCode::Esc | KeyCode::Char('b') => app.dismiss_detail(),
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}
