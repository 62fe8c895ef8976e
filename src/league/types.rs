use serde::Serialize;

/// FPL entry id of a league member
pub type MemberId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String, // manager name, e.g. "Emil Chau"
    pub team_name: String,    // entry name chosen by the manager
    pub excluded: bool,
}

impl Member {
    pub fn new(id: MemberId, display_name: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            team_name: team_name.into(),
            excluded: false,
        }
    }

    /// Public FPL page for this entry
    pub fn profile_url(&self) -> String {
        format!("https://fantasy.premierleague.com/entry/{}/history", self.id)
    }
}

/// One row of the league table as returned by the standings endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub member: Member,
    pub rank: u32,
    pub total: i64, // cumulative points as of the latest gameweek
}

/// A member's result for a single gameweek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodScore {
    pub gameweek: u32,
    pub member_id: MemberId,
    pub total: i64,  // cumulative, including this gameweek
    pub points: i64, // earned in this gameweek alone
}

/// Every elapsed gameweek for one member, ordered by gameweek ascending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberHistory {
    pub member: Member,
    pub periods: Vec<PeriodScore>,
}

impl MemberHistory {
    pub fn new(member: Member, mut periods: Vec<PeriodScore>) -> Self {
        periods.sort_by_key(|p| p.gameweek);
        Self { member, periods }
    }

    /// Record for a specific gameweek, if the member played it
    pub fn at(&self, gameweek: u32) -> Option<&PeriodScore> {
        self.periods
            .binary_search_by_key(&gameweek, |p| p.gameweek)
            .ok()
            .map(|i| &self.periods[i])
    }

    pub fn latest(&self) -> Option<&PeriodScore> {
        self.periods.last()
    }

    /// Cumulative total as of the latest recorded gameweek (0 with no history)
    pub fn current_total(&self) -> i64 {
        self.latest().map(|p| p.total).unwrap_or(0)
    }

    /// Per-gameweek points as floats, oldest first
    pub fn deltas(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.points as f64).collect()
    }
}

/// Current-standings row with its settled net score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetScoreRow {
    pub member: Member,
    pub rank: u32,
    pub total: i64,
    /// Sum of point differences against every other member, undoubled
    pub net_difference: i64,
    pub net_score: i64,
}

/// Net score of one member for one gameweek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetScoreResult {
    pub member_id: MemberId,
    pub gameweek: u32,
    pub total: i64,
    pub net_score: i64,
    pub change: i64, // against the member's previous settled gameweek
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(gameweek: u32, total: i64, points: i64) -> PeriodScore {
        PeriodScore {
            gameweek,
            member_id: 7,
            total,
            points,
        }
    }

    #[test]
    fn test_history_sorted_on_construction() {
        let history = MemberHistory::new(
            Member::new(7, "A", "Team A"),
            vec![period(3, 150, 50), period(1, 60, 60), period(2, 100, 40)],
        );
        let gameweeks: Vec<u32> = history.periods.iter().map(|p| p.gameweek).collect();
        assert_eq!(gameweeks, vec![1, 2, 3]);
        assert_eq!(history.current_total(), 150);
        assert_eq!(history.deltas(), vec![60.0, 40.0, 50.0]);
    }

    #[test]
    fn test_history_lookup_missing_gameweek() {
        let history = MemberHistory::new(
            Member::new(7, "A", "Team A"),
            vec![period(2, 40, 40), period(4, 90, 50)],
        );
        assert!(history.at(1).is_none());
        assert!(history.at(3).is_none());
        assert_eq!(history.at(4).map(|p| p.total), Some(90));
    }

    #[test]
    fn test_empty_history_total_is_zero() {
        let history = MemberHistory::new(Member::new(1, "A", "T"), vec![]);
        assert_eq!(history.current_total(), 0);
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_profile_url() {
        let member = Member::new(4242, "A", "T");
        assert_eq!(
            member.profile_url(),
            "https://fantasy.premierleague.com/entry/4242/history"
        );
    }

    #[test]
    fn test_net_score_row_serializes_both_columns() {
        let row = NetScoreRow {
            member: Member::new(7, "A", "Team A"),
            rank: 1,
            total: 100,
            net_difference: 60,
            net_score: 120,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["net_difference"], 60);
        assert_eq!(value["net_score"], 120);
    }
}
