use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LeagueError;
use crate::fpl::LeagueApi;
use crate::league::{
    excluded_members, member_form, net_score_history, normalize_standings, project_league, settle,
    GameweekSettlement, Member, MemberForm, MemberHistory, MemberId, NetScoreRow, Projection,
};

/// Upper bound on history requests in flight at once
const MAX_CONCURRENT_HISTORY_FETCHES: usize = 4;

/// What to fetch and how to settle it
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub league_id: u64,
    pub exclusions: Vec<String>,
    pub target_gameweek: u32,
    pub trend_window: usize,
}

impl From<&Config> for FetchOptions {
    fn from(config: &Config) -> Self {
        Self {
            league_id: config.league_id,
            exclusions: config.exclude.clone(),
            target_gameweek: config.target_gameweek,
            trend_window: config.trend_window,
        }
    }
}

/// Everything one refresh produces
#[derive(Debug, Clone, Serialize)]
pub struct LeagueSnapshot {
    pub league_id: u64,
    pub league_name: Option<String>,
    pub standings: Vec<NetScoreRow>,
    pub excluded: Vec<Member>,
    pub histories: Vec<MemberHistory>,
    pub settlements: Vec<GameweekSettlement>,
    pub form: Vec<MemberForm>,
    pub projections: Vec<Projection>,
    pub current_gameweek: Option<u32>,
    pub target_gameweek: u32,
    pub fetched_at: DateTime<Utc>,
}

impl LeagueSnapshot {
    pub fn member(&self, member_id: MemberId) -> Option<&Member> {
        self.standings
            .iter()
            .map(|row| &row.member)
            .find(|m| m.id == member_id)
    }

    /// Display name for an id, falling back to the id itself
    pub fn member_name(&self, member_id: MemberId) -> String {
        self.member(member_id)
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| format!("#{}", member_id))
    }

    pub fn settlement(&self, gameweek: u32) -> Option<&GameweekSettlement> {
        self.settlements.iter().find(|s| s.gameweek == gameweek)
    }

    pub fn latest_settlement(&self) -> Option<&GameweekSettlement> {
        self.settlements.last()
    }

    pub fn projection(&self, member_id: MemberId) -> Option<&Projection> {
        self.projections.iter().find(|p| p.member_id == member_id)
    }

    pub fn form(&self, member_id: MemberId) -> Option<&MemberForm> {
        self.form.iter().find(|f| f.member_id == member_id)
    }
}

/// Fetch standings and histories, then settle everything.
///
/// A failed standings request fails the whole refresh; no partial table is
/// produced. A failed history request only removes that member from the
/// history, form and projection views.
pub async fn fetch_league<A: LeagueApi>(api: &A, options: &FetchOptions) -> Result<LeagueSnapshot> {
    let raw = api.standings(options.league_id).await.map_err(|e| {
        let hint = if e.is_unavailable() {
            " (the API is down or mid-update, try again shortly)"
        } else {
            ""
        };
        anyhow::Error::new(e).context(format!(
            "Failed to fetch standings for league {}{}",
            options.league_id, hint
        ))
    })?;

    debug!(members = raw.standings.len(), "fetched standings");

    let excluded = excluded_members(&raw.standings, &options.exclusions);
    let roster = normalize_standings(raw.standings, &options.exclusions);

    if !excluded.is_empty() {
        info!(count = excluded.len(), "excluded members from settlement");
    }

    // Settle before fetching histories so an unusable roster fails fast
    let standings = settle(&roster)?;

    // `buffered` keeps results in roster order
    let members: Vec<Member> = roster.iter().map(|s| s.member.clone()).collect();
    let histories: Vec<MemberHistory> = stream::iter(members)
        .map(|member| async move {
            let result = api.history(member.id).await;
            (member, result)
        })
        .buffered(MAX_CONCURRENT_HISTORY_FETCHES)
        .filter_map(|(member, result)| async move {
            match result {
                Ok(periods) if !periods.is_empty() => Some(MemberHistory::new(member, periods)),
                Ok(_) => {
                    warn!(member = %member.display_name, "no gameweeks played yet");
                    None
                }
                Err(e) => {
                    warn!(member = %member.display_name, error = %e, "history fetch failed");
                    None
                }
            }
        })
        .collect()
        .await;

    debug!(
        with_history = histories.len(),
        roster = roster.len(),
        "fetched histories"
    );

    let settlements = net_score_history(&histories);
    let current_gameweek = histories
        .iter()
        .filter_map(|h| h.latest().map(|p| p.gameweek))
        .max();

    let form = histories
        .iter()
        .map(|h| member_form(h, &settlements))
        .collect();

    let projections = match current_gameweek {
        Some(current) => {
            match project_league(&histories, current, options.target_gameweek, options.trend_window) {
                Ok(projections) => projections,
                Err(e) => {
                    warn!(error = %e, "projection skipped");
                    Vec::new()
                }
            }
        }
        None => {
            warn!(error = %LeagueError::NoHistory, "projection skipped");
            Vec::new()
        }
    };

    Ok(LeagueSnapshot {
        league_id: options.league_id,
        league_name: raw.name,
        standings,
        excluded,
        histories,
        settlements,
        form,
        projections,
        current_gameweek,
        target_gameweek: options.target_gameweek,
        fetched_at: Utc::now(),
    })
}
