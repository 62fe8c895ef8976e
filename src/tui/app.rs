use std::time::Instant;

use crate::config::Config;
use crate::fetch::LeagueSnapshot;
use crate::league::MemberId;
use crate::tui::theme::ThemeColors;

/// Seconds a flash message stays in the status bar
const FLASH_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Standings,
    History,
    Projection,
    Form,
}

impl View {
    pub const ALL: [View; 4] = [View::Standings, View::History, View::Projection, View::Form];

    pub fn title(&self) -> &'static str {
        match self {
            View::Standings => "Standings",
            View::History => "History",
            View::Projection => "Projection",
            View::Form => "Form",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Standings => 0,
            View::History => 1,
            View::Projection => 2,
            View::Form => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
    Detail,
}

pub struct App {
    pub snapshot: Option<LeagueSnapshot>,
    pub table_state: ratatui::widgets::TableState,
    pub current_view: View,
    /// Gameweek shown in the History view; `None` follows the latest
    pub history_gameweek: Option<u32>,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, Instant)>,
    /// Why the most recent refresh failed; cleared by the next good one
    pub last_error: Option<String>,
    pub last_refresh: Instant,
    pub last_interaction: Instant,
    pub needs_refresh: bool,
    pub force_refresh: bool,
    pub should_quit: bool,
    pub config: Config,
    pub theme: ThemeColors,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl App {
    /// App with no data yet, waiting for the first fetch
    pub fn new_loading(config: Config, theme: ThemeColors) -> Self {
        Self {
            snapshot: None,
            table_state: ratatui::widgets::TableState::default(),
            current_view: View::Standings,
            history_gameweek: None,
            input_mode: InputMode::Normal,
            flash_message: None,
            last_error: None,
            last_refresh: Instant::now(),
            last_interaction: Instant::now(),
            needs_refresh: false,
            force_refresh: false,
            should_quit: false,
            config,
            theme,
            is_loading: true,
            spinner_frame: 0,
        }
    }

    /// Gameweek the History view is showing
    pub fn displayed_gameweek(&self) -> Option<u32> {
        let snapshot = self.snapshot.as_ref()?;
        match self.history_gameweek {
            Some(gw) if snapshot.settlement(gw).is_some() => Some(gw),
            _ => snapshot.latest_settlement().map(|s| s.gameweek),
        }
    }

    /// Member ids in the order the current view lists them
    pub fn row_ids(&self) -> Vec<MemberId> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        match self.current_view {
            View::Standings => snapshot.standings.iter().map(|r| r.member.id).collect(),
            View::History => self
                .displayed_gameweek()
                .and_then(|gw| snapshot.settlement(gw))
                .map(|s| s.ranked().iter().map(|r| r.member_id).collect())
                .unwrap_or_default(),
            View::Projection => snapshot.projections.iter().map(|p| p.member_id).collect(),
            View::Form => snapshot.form.iter().map(|f| f.member_id).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_ids().len()
    }

    pub fn selected_member_id(&self) -> Option<MemberId> {
        let ids = self.row_ids();
        self.table_state.selected().and_then(|i| ids.get(i).copied())
    }

    pub fn next_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Keep the selection inside the current row list
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Select `member` if the current view lists them, otherwise the first row
    fn select_member(&mut self, member: Option<MemberId>) {
        let position = member.and_then(|id| self.row_ids().iter().position(|&m| m == id));
        match position {
            Some(i) => self.table_state.select(Some(i)),
            None => {
                self.table_state.select(None);
                self.clamp_selection();
            }
        }
    }

    /// Switch view, keeping the same member selected when they appear in it
    pub fn set_view(&mut self, view: View) {
        let member = self.selected_member_id();
        self.current_view = view;
        self.select_member(member);
    }

    pub fn next_view(&mut self) {
        let next = View::ALL[(self.current_view.index() + 1) % View::ALL.len()];
        self.set_view(next);
    }

    pub fn previous_view(&mut self) {
        let len = View::ALL.len();
        let previous = View::ALL[(self.current_view.index() + len - 1) % len];
        self.set_view(previous);
    }

    /// Step the History view to an earlier (`-1`) or later (`+1`) settled
    /// gameweek. Stepping past the latest goes back to following it.
    pub fn step_gameweek(&mut self, direction: i32) {
        if self.current_view != View::History {
            return;
        }
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let gameweeks: Vec<u32> = snapshot.settlements.iter().map(|s| s.gameweek).collect();
        let member = self.selected_member_id();
        let Some(current) = self
            .displayed_gameweek()
            .and_then(|gw| gameweeks.iter().position(|&g| g == gw))
        else {
            return;
        };

        let target = if direction < 0 {
            current.checked_sub(1)
        } else {
            Some(current + 1).filter(|&i| i < gameweeks.len())
        };

        match target {
            Some(i) if i + 1 == gameweeks.len() => self.history_gameweek = None,
            Some(i) => self.history_gameweek = Some(gameweeks[i]),
            None => return,
        }
        self.select_member(member);
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    /// Open the selected member's FPL page in the browser
    pub fn open_selected(&mut self) {
        let Some(member) = self
            .selected_member_id()
            .and_then(|id| self.snapshot.as_ref()?.member(id).cloned())
        else {
            return;
        };

        match crate::browser::open_member(&member) {
            Ok(()) => self.show_flash(format!("Opened: {}", member.display_name)),
            Err(e) => self.show_flash(format!("Failed to open browser: {}", e)),
        }
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Show the breakdown popup for the selected member
    pub fn show_detail(&mut self) {
        if self.selected_member_id().is_some() {
            self.input_mode = InputMode::Detail;
        }
    }

    pub fn dismiss_detail(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Request a refresh that skips the response cache
    pub fn request_forced_refresh(&mut self) {
        self.needs_refresh = true;
        self.force_refresh = true;
        self.show_flash("Refreshing (fresh data)...".to_string());
    }

    /// Record a failed refresh. Any snapshot already shown is kept.
    pub fn refresh_failed(&mut self, error: String) {
        self.show_flash(format!("Refresh failed: {}", error));
        self.last_error = Some(error);
    }

    /// Replace the data with a fresh snapshot
    pub fn update_snapshot(&mut self, snapshot: LeagueSnapshot) {
        let member = self.selected_member_id();
        let count = snapshot.standings.len();
        let gameweek = snapshot.current_gameweek;
        self.snapshot = Some(snapshot);
        self.last_error = None;
        self.select_member(member);

        self.last_refresh = Instant::now();
        match gameweek {
            Some(gw) => self.show_flash(format!("Refreshed ({} managers, GW{})", count, gw)),
            None => self.show_flash(format!("Refreshed ({} managers)", count)),
        }
    }

    /// Advance the loading spinner animation frame
    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}
