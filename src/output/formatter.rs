use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::fetch::LeagueSnapshot;
use crate::league::{Member, MemberForm, NetScoreRow, Projection};

/// Gameweek columns shown in the history matrix
const HISTORY_COLUMNS: usize = 6;

/// Width of the name column when stdout is not a terminal
const DEFAULT_NAME_WIDTH: usize = 24;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Name column width that leaves room for `fixed_width` of other columns
fn name_width(fixed_width: usize) -> usize {
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => (width - fixed_width).min(DEFAULT_NAME_WIDTH),
        Some(_) => 10,
        None => DEFAULT_NAME_WIDTH,
    }
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Pad by characters rather than bytes
fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Signed net score: "+120", "-40", "0"
fn signed(net: i64) -> String {
    if net > 0 {
        format!("+{}", net)
    } else {
        net.to_string()
    }
}

/// Colour already padded text by the sign of `net`
fn paint(text: String, net: i64, use_colors: bool) -> String {
    if !use_colors {
        return text;
    }
    match net.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text,
    }
}

/// Signed net score, green when positive and red when negative
pub fn format_net(net: i64, use_colors: bool) -> String {
    paint(signed(net), net, use_colors)
}

fn header(text: String, use_colors: bool) -> String {
    if use_colors {
        text.dimmed().to_string()
    } else {
        text
    }
}

/// Title line above the standings table, naming anyone left out
pub fn format_standings_title(
    league_name: Option<&str>,
    gameweek: Option<u32>,
    excluded: &[Member],
) -> String {
    let mut title = match (league_name, gameweek) {
        (Some(name), Some(gw)) => format!("{} (GW{}): Standings", name, gw),
        (Some(name), None) => format!("{}: Standings", name),
        (None, Some(gw)) => format!("Standings (GW{})", gw),
        (None, None) => "Standings".to_string(),
    };
    if !excluded.is_empty() {
        let names: Vec<&str> = excluded.iter().map(|m| m.display_name.as_str()).collect();
        title.push_str(&format!(" (Excluding {})", names.join(", ")));
    }
    title
}

/// Closing line after a successful settlement
pub fn format_summary(managers: usize) -> String {
    format!("Calculation complete for {} managers.", managers)
}

/// Current net score table: index, manager, team, total, difference, net
pub fn format_standings_table(rows: &[NetScoreRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No standings found.".to_string();
    }

    // index 4 + total 7 + diff 7 + net 7 + separators
    let width = name_width(38);
    let team_width = width.min(20);

    let mut lines = vec![header(
        format!(
            "{:>3}  {}  {}  {:>6}  {:>6}  {:>6}",
            "#",
            pad_right("Manager", width),
            pad_right("Team", team_width),
            "Total",
            "Diff",
            "Net"
        ),
        use_colors,
    )];

    lines.extend(rows.iter().enumerate().map(|(idx, row)| {
        let index = format!("{:>2}.", idx + 1);
        let name = pad_right(&truncate_name(&row.member.display_name, width), width);
        let team = pad_right(&truncate_name(&row.member.team_name, team_width), team_width);
        let diff = paint(
            format!("{:>6}", signed(row.net_difference)),
            row.net_difference,
            use_colors,
        );
        let net = paint(format!("{:>6}", signed(row.net_score)), row.net_score, use_colors);

        if use_colors {
            format!(
                "{}  {}  {}  {:>6}  {}  {}",
                index.dimmed(),
                name.bold(),
                team.cyan(),
                row.total,
                diff,
                net
            )
        } else {
            format!("{}  {}  {}  {:>6}  {}  {}", index, name, team, row.total, diff, net)
        }
    }));

    lines.join("\n")
}

/// Net scores for one gameweek, or the matrix of the latest gameweeks when
/// `gameweek` is `None`
pub fn format_history_table(
    snapshot: &LeagueSnapshot,
    gameweek: Option<u32>,
    use_colors: bool,
) -> String {
    match gameweek {
        Some(gw) => format_gameweek_table(snapshot, gw, use_colors),
        None => format_history_matrix(snapshot, use_colors),
    }
}

fn format_gameweek_table(snapshot: &LeagueSnapshot, gameweek: u32, use_colors: bool) -> String {
    let Some(settlement) = snapshot.settlement(gameweek) else {
        return format!("No settled results for gameweek {}.", gameweek);
    };

    let width = name_width(36);
    let mut lines = vec![header(
        format!(
            "GW{:<2} {}  {:>6}  {:>6}  {:>7}",
            gameweek,
            pad_right("Manager", width),
            "Total",
            "Net",
            "Change"
        ),
        use_colors,
    )];

    lines.extend(settlement.ranked().iter().enumerate().map(|(idx, result)| {
        let name = truncate_name(&snapshot.member_name(result.member_id), width);
        let net = paint(format!("{:>6}", signed(result.net_score)), result.net_score, use_colors);
        let change = paint(format!("{:>7}", signed(result.change)), result.change, use_colors);
        format!(
            "{:>3}. {}  {:>6}  {}  {}",
            idx + 1,
            pad_right(&name, width),
            result.total,
            net,
            change
        )
    }));

    lines.join("\n")
}

fn format_history_matrix(snapshot: &LeagueSnapshot, use_colors: bool) -> String {
    if snapshot.settlements.is_empty() {
        return "No settled gameweeks yet.".to_string();
    }

    let start = snapshot.settlements.len().saturating_sub(HISTORY_COLUMNS);
    let shown = &snapshot.settlements[start..];
    let width = name_width(shown.len() * 8);

    let mut head = pad_right("Manager", width);
    for settlement in shown {
        head.push_str(&format!("  {:>6}", format!("GW{}", settlement.gameweek)));
    }
    let mut lines = vec![header(head, use_colors)];

    for row in &snapshot.standings {
        let mut line = pad_right(&truncate_name(&row.member.display_name, width), width);
        for settlement in shown {
            let cell = match settlement.result_for(row.member.id) {
                Some(result) => {
                    paint(format!("{:>6}", signed(result.net_score)), result.net_score, use_colors)
                }
                None => format!("{:>6}", "-"),
            };
            line.push_str("  ");
            line.push_str(&cell);
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Projected final standings with the 95% band on each total
pub fn format_projection_table(projections: &[Projection], use_colors: bool) -> String {
    if projections.is_empty() {
        return "Not enough history to project.".to_string();
    }

    let width = name_width(50);
    let mut lines = vec![header(
        format!(
            "{:>3}  {}  {:>6}  {:>6}  {:>15}  {:>6}",
            "#",
            pad_right("Manager", width),
            "Now",
            "Trend",
            "Final (95%)",
            "Net"
        ),
        use_colors,
    )];

    lines.extend(projections.iter().enumerate().map(|(idx, p)| {
        let name = pad_right(&truncate_name(&p.display_name, width), width);
        let band = format!(
            "{:.0} ±{:.0}",
            p.projected_final_total, p.margin
        );
        let net = paint(
            format!("{:>6}", signed(p.projected_final_net_score)),
            p.projected_final_net_score,
            use_colors,
        );
        format!(
            "{:>2}.  {}  {:>6}  {:>6.1}  {:>15}  {}",
            idx + 1,
            name,
            p.current_total,
            p.weighted_average,
            band,
            net
        )
    }));

    lines.join("\n")
}

/// Descriptive statistics per member
pub fn format_form_table(form: &[MemberForm], use_colors: bool) -> String {
    if form.is_empty() {
        return "No form data yet.".to_string();
    }

    let width = name_width(48);
    let mut lines = vec![header(
        format!(
            "{}  {:>3}  {:>6}  {:>6}  {:>9}  {:>6}  {:>5}",
            pad_right("Manager", width),
            "GWs",
            "Mean",
            "StdDev",
            "Best",
            "Recent",
            "RSI"
        ),
        use_colors,
    )];

    lines.extend(form.iter().map(|f| {
        let std_dev = f
            .std_dev
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        let best = f
            .best_gameweek
            .map(|(gw, points)| format!("{} (GW{})", points, gw))
            .unwrap_or_else(|| "-".to_string());
        let rsi = format!("{:>5.0}", f.net_rsi);
        let rsi = if use_colors && f.net_rsi >= 70.0 {
            rsi.green().to_string()
        } else if use_colors && f.net_rsi <= 30.0 {
            rsi.red().to_string()
        } else {
            rsi
        };
        format!(
            "{}  {:>3}  {:>6.1}  {:>6}  {:>9}  {:>6.1}  {}",
            pad_right(&truncate_name(&f.display_name, width), width),
            f.gameweeks,
            f.mean_points,
            std_dev,
            best,
            f.recent_average,
            rsi
        )
    }));

    lines.join("\n")
}

/// Standings as tab-separated values for scripting
/// Columns: id, manager, team, total, difference, net (no headers, no colors)
pub fn format_standings_tsv(rows: &[NetScoreRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.member.id,
                row.member.display_name,
                row.member.team_name,
                row.total,
                row.net_difference,
                row.net_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// History as tab-separated values
/// Columns: gameweek, id, manager, total, net, change
pub fn format_history_tsv(snapshot: &LeagueSnapshot, gameweek: Option<u32>) -> String {
    snapshot
        .settlements
        .iter()
        .filter(|s| gameweek.map_or(true, |gw| s.gameweek == gw))
        .flat_map(|s| {
            s.ranked().into_iter().map(move |r| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    s.gameweek,
                    r.member_id,
                    snapshot.member_name(r.member_id),
                    r.total,
                    r.net_score,
                    r.change
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Projections as tab-separated values
/// Columns: id, manager, current, projected, lower, upper, net
pub fn format_projection_tsv(projections: &[Projection]) -> String {
    projections
        .iter()
        .map(|p| {
            format!(
                "{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}\t{}",
                p.member_id,
                p.display_name,
                p.current_total,
                p.projected_final_total,
                p.lower_bound,
                p.upper_bound,
                p.projected_final_net_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Form as tab-separated values
/// Columns: id, manager, gameweeks, mean, std dev (empty if undefined), recent, rsi
pub fn format_form_tsv(form: &[MemberForm]) -> String {
    form.iter()
        .map(|f| {
            format!(
                "{}\t{}\t{}\t{:.2}\t{}\t{:.2}\t{:.1}",
                f.member_id,
                f.display_name,
                f.gameweeks,
                f.mean_points,
                f.std_dev.map(|s| format!("{:.2}", s)).unwrap_or_default(),
                f.recent_average,
                f.net_rsi
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
