//! Wire shapes of the FPL endpoints. Only the fields the league view needs
//! are decoded; everything else in the payload is ignored.

use serde::Deserialize;

use crate::league::{Member, MemberId, PeriodScore, Standing};

#[derive(Debug, Deserialize)]
pub struct StandingsResponse {
    #[serde(default)]
    pub league: Option<LeagueInfo>,
    pub standings: StandingsPage,
}

#[derive(Debug, Deserialize)]
pub struct LeagueInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StandingsPage {
    pub results: Vec<StandingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StandingEntry {
    pub entry: u64,
    pub player_name: String,
    pub entry_name: String,
    pub total: i64,
    pub rank: u32,
}

impl From<StandingEntry> for Standing {
    fn from(entry: StandingEntry) -> Self {
        Standing {
            member: Member::new(entry.entry, entry.player_name, entry.entry_name),
            rank: entry.rank,
            total: entry.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub current: Vec<EventHistory>,
}

/// One gameweek in an entry's history
#[derive(Debug, Deserialize)]
pub struct EventHistory {
    pub event: u32,
    pub points: i64,
    pub total_points: i64,
    #[serde(default)]
    pub event_transfers_cost: i64,
}

impl EventHistory {
    /// `points` is gross; the cumulative total has hit costs taken off
    pub fn into_period(self, member_id: MemberId) -> PeriodScore {
        PeriodScore {
            gameweek: self.event,
            member_id,
            total: self.total_points,
            points: self.points - self.event_transfers_cost,
        }
    }
}

/// Decoded league table
#[derive(Debug, Clone)]
pub struct LeagueStandings {
    pub name: Option<String>,
    pub standings: Vec<Standing>,
}

impl From<StandingsResponse> for LeagueStandings {
    fn from(response: StandingsResponse) -> Self {
        LeagueStandings {
            name: response.league.map(|l| l.name),
            standings: response
                .standings
                .results
                .into_iter()
                .map(Standing::from)
                .collect(),
        }
    }
}
