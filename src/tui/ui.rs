use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};

use crate::fetch::LeagueSnapshot;
use crate::tui::app::{App, InputMode, View};
use crate::tui::theme::ThemeColors;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 6 || area.width < 30 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Tabs(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    render_table(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    match app.input_mode {
        InputMode::Help => render_help_popup(frame, &app.theme),
        InputMode::Detail => render_detail_popup(frame, app),
        InputMode::Normal => {}
    }

    // Loading overlay sits on top of everything
    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn signed(net: i64) -> String {
    if net > 0 {
        format!("+{}", net)
    } else {
        net.to_string()
    }
}

fn net_cell(net: i64, theme: &ThemeColors) -> Cell<'static> {
    Cell::from(Line::from(signed(net)).alignment(Alignment::Right))
        .style(Style::default().fg(theme.net_color(net)))
}

fn right(text: String) -> Cell<'static> {
    Cell::from(Line::from(text).alignment(Alignment::Right))
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let name = app
        .snapshot
        .as_ref()
        .and_then(|s| s.league_name.clone())
        .unwrap_or_else(|| format!("League {}", app.config.league_id));
    let left = format!("fpl-net  {}", name);

    let mut spans = vec![Span::styled(
        left.clone(),
        Style::default().fg(app.theme.title_color).bold(),
    )];

    if let Some(gw) = app.snapshot.as_ref().and_then(|s| s.current_gameweek) {
        let right_text = format!("GW{} of {}", gw, app.config.target_gameweek);
        let padding = (area.width as usize).saturating_sub(left.chars().count() + right_text.len());
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(right_text, Style::default().fg(app.theme.muted)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<String> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| format!("{} {}", i + 1, view.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style.reversed())
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn render_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let Some(snapshot) = &app.snapshot else {
        if let Some(error) = &app.last_error {
            render_error(frame, area, error, &app.theme);
            return;
        }
        let msg = if app.is_loading { "" } else { "No data yet. Press r to retry." };
        frame.render_widget(Paragraph::new(msg).alignment(Alignment::Center), area);
        return;
    };

    let theme = &app.theme;
    let (header, rows, widths) = match app.current_view {
        View::Standings => standings_rows(snapshot, theme),
        View::History => match app.displayed_gameweek() {
            Some(gw) => history_rows(snapshot, gw, theme),
            None => {
                frame.render_widget(
                    Paragraph::new("No settled gameweeks yet").alignment(Alignment::Center),
                    area,
                );
                return;
            }
        },
        View::Projection => projection_rows(snapshot, theme),
        View::Form => form_rows(snapshot, theme),
    };

    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("Nothing to show").alignment(Alignment::Center),
            area,
        );
        return;
    }

    // Alternating row background (odd rows get subtle background)
    let rows: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            if idx % 2 == 1 {
                row.style(Style::default().bg(theme.row_alt_bg))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme.header_style).bottom_margin(1))
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

/// Failure shown in place of the table when there is nothing to fall back on
fn render_error(frame: &mut Frame, area: Rect, error: &str, theme: &ThemeColors) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Could not load the league",
            Style::default().fg(theme.flash_error).bold(),
        )),
        Line::from(Span::styled(error.to_string(), Style::default().fg(theme.flash_error))),
        Line::from(""),
        Line::from(Span::styled("Press r to retry.", Style::default().fg(theme.muted))),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

type TableParts = (Vec<&'static str>, Vec<Row<'static>>, Vec<Constraint>);

fn index_cell(idx: usize, theme: &ThemeColors) -> Cell<'static> {
    Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(theme.index_color))
}

fn standings_rows(snapshot: &LeagueSnapshot, theme: &ThemeColors) -> TableParts {
    let rows = snapshot
        .standings
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            Row::new(vec![
                index_cell(idx, theme),
                Cell::from(row.member.display_name.clone()),
                Cell::from(row.member.team_name.clone()).style(Style::default().fg(theme.muted)),
                right(row.total.to_string()),
                net_cell(row.net_difference, theme),
                net_cell(row.net_score, theme),
            ])
        })
        .collect();

    (
        vec!["#", "Manager", "Team", "Total", "Diff", "Net"],
        rows,
        vec![
            Constraint::Length(4),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
}

fn history_rows(snapshot: &LeagueSnapshot, gameweek: u32, theme: &ThemeColors) -> TableParts {
    let rows = snapshot
        .settlement(gameweek)
        .map(|s| s.ranked())
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, result)| {
            let points = snapshot
                .histories
                .iter()
                .find(|h| h.member.id == result.member_id)
                .and_then(|h| h.at(gameweek))
                .map(|p| p.points.to_string())
                .unwrap_or_default();
            Row::new(vec![
                index_cell(idx, theme),
                Cell::from(snapshot.member_name(result.member_id)),
                right(points),
                right(result.total.to_string()),
                net_cell(result.net_score, theme),
                net_cell(result.change, theme),
            ])
        })
        .collect();

    (
        vec!["#", "Manager", "Pts", "Total", "Net", "Change"],
        rows,
        vec![
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
}

fn projection_rows(snapshot: &LeagueSnapshot, theme: &ThemeColors) -> TableParts {
    let rows = snapshot
        .projections
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            Row::new(vec![
                index_cell(idx, theme),
                Cell::from(p.display_name.clone()),
                right(p.current_total.to_string()),
                right(format!("{:.1}", p.weighted_average)),
                right(format!("{:.0}", p.projected_final_total)),
                right(format!("{:.0}–{:.0}", p.lower_bound, p.upper_bound))
                    .style(Style::default().fg(theme.muted)),
                net_cell(p.projected_final_net_score, theme),
            ])
        })
        .collect();

    (
        vec!["#", "Manager", "Now", "Trend", "Final", "95% band", "Net"],
        rows,
        vec![
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(7),
        ],
    )
}

fn form_rows(snapshot: &LeagueSnapshot, theme: &ThemeColors) -> TableParts {
    let rows = snapshot
        .form
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let rsi_color = if f.net_rsi >= 70.0 {
                theme.net_positive
            } else if f.net_rsi <= 30.0 {
                theme.net_negative
            } else {
                theme.net_zero
            };
            Row::new(vec![
                index_cell(idx, theme),
                Cell::from(f.display_name.clone()),
                right(format!("{:.1}", f.mean_points)),
                right(f.std_dev.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "-".to_string())),
                right(
                    f.best_gameweek
                        .map(|(gw, pts)| format!("{} GW{}", pts, gw))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                right(format!("{:.1}", f.recent_average)),
                right(format!("{:.0}", f.net_rsi)).style(Style::default().fg(rsi_color)),
            ])
        })
        .collect();

    (
        vec!["#", "Manager", "Mean", "StdDev", "Best", "Recent", "RSI"],
        rows,
        vec![
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(5),
        ],
    )
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.contains("failed") || msg.contains("timed out") {
            theme.flash_error
        } else if msg.starts_with("Refreshed") || msg.starts_with("Opened:") {
            theme.flash_success
        } else {
            theme.muted
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let elapsed = app.last_refresh.elapsed();
        let refresh_time = if elapsed.as_secs() < 60 {
            format!("refreshed {}s ago", elapsed.as_secs())
        } else {
            format!("refreshed {}m ago", elapsed.as_secs() / 60)
        };

        let mut hints = vec![("j/k", ":nav "), ("Tab", ":view ")];
        if app.current_view == View::History {
            hints.push(("h/l", ":gameweek "));
        }
        hints.extend([
            ("Enter", ":open "),
            ("b", ":detail "),
            ("r", ":refresh "),
            ("?", ":help "),
            ("q", ":quit"),
        ]);

        let mut spans = match (&app.last_error, &app.snapshot) {
            // Data on screen is from an earlier refresh
            (Some(error), Some(_)) => vec![
                Span::styled(
                    format!("stale, {}: {}", refresh_time, error),
                    Style::default().fg(theme.flash_error),
                ),
                Span::raw("  "),
            ],
            _ => vec![
                Span::styled(refresh_time, Style::default().fg(theme.muted)),
                Span::raw("  "),
            ],
        };
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn popup_block(title: &str, theme: &ThemeColors) -> Block<'static> {
    Block::bordered()
        .title(format!(" {} ", title))
        .title_style(theme.popup_title)
        .border_style(Style::default().fg(theme.popup_border))
        .style(Style::default().bg(theme.popup_bg))
}

fn render_help_popup(frame: &mut Frame, theme: &ThemeColors) {
    let popup_area = centered_rect_fixed(50, 15, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block("Keyboard Shortcuts", theme);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(theme.status_key_color).bold();
    let entries = [
        ("j / Down      ", "Move down"),
        ("k / Up        ", "Move up"),
        ("Tab / 1-4     ", "Switch view"),
        ("h / l         ", "Previous / next gameweek"),
        ("Enter / o     ", "Open manager on FPL"),
        ("b             ", "Projection breakdown"),
        ("r             ", "Refresh (bypasses cache)"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*desc)]))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(theme.muted),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the per-member breakdown popup
fn render_detail_popup(frame: &mut Frame, app: &App) {
    let (Some(snapshot), Some(member_id)) = (&app.snapshot, app.selected_member_id()) else {
        return;
    };
    let theme = &app.theme;

    let popup_area = centered_rect_fixed(56, 18, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block(&snapshot.member_name(member_id), theme);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let label = Style::default().fg(theme.muted);
    let field = |name: &str, value: String| {
        Line::from(vec![Span::styled(format!("{:<22}", name), label), Span::raw(value)])
    };

    let mut lines = Vec::new();

    if let Some(row) = snapshot.standings.iter().find(|r| r.member.id == member_id) {
        lines.push(field("Team", row.member.team_name.clone()));
        lines.push(Line::from(vec![
            Span::styled(format!("{:<22}", "Total / net"), label),
            Span::raw(format!("{} / ", row.total)),
            Span::styled(signed(row.net_score), Style::default().fg(theme.net_color(row.net_score))),
        ]));
    }

    match snapshot.projection(member_id) {
        Some(p) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Projection to GW{}", snapshot.target_gameweek),
                theme.popup_title,
            )));
            lines.push(field("Weighted trend", format!("{:.1} pts/GW", p.weighted_average)));
            lines.push(field(
                "Std deviation",
                p.std_dev
                    .map(|s| format!("{:.1}", s))
                    .unwrap_or_else(|| "n/a".to_string()),
            ));
            lines.push(field("Gameweeks left", p.remaining.to_string()));
            lines.push(field(
                "Final total",
                format!("{:.0} ± {:.0}", p.projected_final_total, p.margin),
            ));
            lines.push(field(
                "95% band",
                format!("{:.0} to {:.0}", p.lower_bound, p.upper_bound),
            ));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<22}", "Projected net"), label),
                Span::styled(
                    signed(p.projected_final_net_score),
                    Style::default().fg(theme.net_color(p.projected_final_net_score)),
                ),
            ]));
        }
        None => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("No projection available", label)));
        }
    }

    if let Some(f) = snapshot.form(member_id) {
        lines.push(Line::from(""));
        lines.push(field("Mean points", format!("{:.1}", f.mean_points)));
        lines.push(field("Net RSI", format!("{:.0}", f.net_rsi)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc / b to close", label)));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the loading spinner overlay
fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let text = if app.snapshot.is_none() {
        format!("{} Loading league...", spinner)
    } else {
        format!("{} Refreshing...", spinner)
    };

    let loading_text = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));

    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::LeagueError;
    use crate::league::{settle, Member, Standing};
    use chrono::Utc;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::{Duration, Instant};

    fn rendered(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn idle_app() -> App {
        let mut app = App::new_loading(Config::default(), ThemeColors::dark());
        app.is_loading = false;
        app
    }

    fn expire_flash(app: &mut App) {
        if let Some((_, shown_at)) = app.flash_message.as_mut() {
            *shown_at = Instant::now() - Duration::from_secs(60);
        }
        app.update_flash();
        assert!(app.flash_message.is_none());
    }

    fn snapshot() -> LeagueSnapshot {
        let standings: Vec<Standing> = [(1, "Alice", 100), (2, "Bob", 80), (3, "Carol", 60)]
            .into_iter()
            .map(|(id, name, total)| Standing {
                member: Member::new(id, name, format!("{} XI", name)),
                rank: id as u32,
                total,
            })
            .collect();
        LeagueSnapshot {
            league_id: 1,
            league_name: Some("Office League".to_string()),
            standings: settle(&standings).unwrap(),
            excluded: vec![],
            histories: vec![],
            settlements: vec![],
            form: vec![],
            projections: vec![],
            current_gameweek: None,
            target_gameweek: 38,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_failure_without_data_stays_on_screen() {
        let mut app = idle_app();
        app.refresh_failed(LeagueError::InsufficientMembers { found: 1 }.to_string());
        expire_flash(&mut app);

        let screen = rendered(&mut app);
        assert!(screen.contains("Could not load the league"));
        assert!(screen.contains("insufficient data"));
        assert!(!screen.contains("No data yet"));
    }

    #[test]
    fn test_failure_with_stale_data_marks_status_bar() {
        let mut app = idle_app();
        app.update_snapshot(snapshot());
        app.refresh_failed("timed out after 20s".to_string());
        expire_flash(&mut app);

        let screen = rendered(&mut app);
        assert!(screen.contains("Alice"));
        assert!(screen.contains("stale"));
        assert!(screen.contains("timed out after 20s"));
    }

    #[test]
    fn test_successful_refresh_clears_failure() {
        let mut app = idle_app();
        app.refresh_failed("https://example.test returned HTTP 503".to_string());
        app.update_snapshot(snapshot());
        expire_flash(&mut app);

        let screen = rendered(&mut app);
        assert!(screen.contains("Diff"));
        assert!(screen.contains("+60"));
        assert!(!screen.contains("stale"));
        assert!(!screen.contains("HTTP 503"));
    }

    #[test]
    fn test_empty_app_prompts_retry() {
        let mut app = idle_app();
        assert!(rendered(&mut app).contains("No data yet. Press r to retry."));
    }
}
