use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use super::net_score::{net_scores, MIN_MEMBERS};
use super::types::{MemberHistory, MemberId, NetScoreResult};

/// Net scores of every member who played one gameweek
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameweekSettlement {
    pub gameweek: u32,
    pub results: Vec<NetScoreResult>,
}

impl GameweekSettlement {
    pub fn result_for(&self, member_id: MemberId) -> Option<&NetScoreResult> {
        self.results.iter().find(|r| r.member_id == member_id)
    }

    /// Results ordered by net score descending, ties by member id
    pub fn ranked(&self) -> Vec<NetScoreResult> {
        let mut ranked = self.results.clone();
        ranked.sort_by(|a, b| b.net_score.cmp(&a.net_score).then(a.member_id.cmp(&b.member_id)));
        ranked
    }
}

/// Settle every gameweek independently from the cumulative totals as of that
/// gameweek.
///
/// A gameweek's roster is whoever has a record for it; members missing a
/// gameweek sit that one out. Gameweeks with fewer than two members are
/// skipped. `change` is measured against the member's previous settled
/// gameweek, or against 0 for their first.
pub fn net_score_history(histories: &[MemberHistory]) -> Vec<GameweekSettlement> {
    let gameweeks: BTreeSet<u32> = histories
        .iter()
        .flat_map(|h| h.periods.iter().map(|p| p.gameweek))
        .collect();

    let mut previous: HashMap<MemberId, i64> = HashMap::new();
    let mut settlements = Vec::with_capacity(gameweeks.len());

    for gameweek in gameweeks {
        let roster: Vec<_> = histories.iter().filter_map(|h| h.at(gameweek)).collect();

        if roster.len() < MIN_MEMBERS {
            debug!(gameweek, members = roster.len(), "skipping gameweek with too few members");
            continue;
        }

        let totals: Vec<i64> = roster.iter().map(|p| p.total).collect();
        let results = roster
            .iter()
            .zip(net_scores(&totals))
            .map(|(period, net_score)| {
                let prior = previous.insert(period.member_id, net_score).unwrap_or(0);
                NetScoreResult {
                    member_id: period.member_id,
                    gameweek,
                    total: period.total,
                    net_score,
                    change: net_score - prior,
                }
            })
            .collect();

        settlements.push(GameweekSettlement { gameweek, results });
    }

    settlements
}

/// One member's `(gameweek, net score)` series across settlements
pub fn member_series(settlements: &[GameweekSettlement], member_id: MemberId) -> Vec<(u32, i64)> {
    settlements
        .iter()
        .filter_map(|s| s.result_for(member_id).map(|r| (s.gameweek, r.net_score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::types::{Member, PeriodScore};

    fn history(id: u64, totals: &[(u32, i64)]) -> MemberHistory {
        let mut previous = 0;
        let periods = totals
            .iter()
            .map(|&(gameweek, total)| {
                let points = total - previous;
                previous = total;
                PeriodScore {
                    gameweek,
                    member_id: id,
                    total,
                    points,
                }
            })
            .collect();
        MemberHistory::new(Member::new(id, format!("M{}", id), "T"), periods)
    }

    #[test]
    fn test_each_gameweek_is_zero_sum() {
        let histories = vec![
            history(1, &[(1, 60), (2, 110), (3, 150)]),
            history(2, &[(1, 40), (2, 100), (3, 170)]),
            history(3, &[(1, 55), (2, 90), (3, 140)]),
        ];
        let settlements = net_score_history(&histories);
        assert_eq!(settlements.len(), 3);
        for settlement in &settlements {
            let sum: i64 = settlement.results.iter().map(|r| r.net_score).sum();
            assert_eq!(sum, 0, "gameweek {}", settlement.gameweek);
        }
    }

    #[test]
    fn test_settles_from_cumulative_totals() {
        let histories = vec![
            history(1, &[(1, 100)]),
            history(2, &[(1, 80)]),
            history(3, &[(1, 60)]),
        ];
        let settlements = net_score_history(&histories);
        let nets: Vec<i64> = settlements[0].results.iter().map(|r| r.net_score).collect();
        assert_eq!(nets, vec![120, 0, -120]);
    }

    #[test]
    fn test_change_against_previous_gameweek() {
        let histories = vec![
            history(1, &[(1, 50), (2, 100)]),
            history(2, &[(1, 40), (2, 110)]),
        ];
        let settlements = net_score_history(&histories);
        // GW1: [20, -20], GW2: [-20, 20]
        let first = settlements[0].result_for(1).unwrap();
        assert_eq!(first.net_score, 20);
        assert_eq!(first.change, 20); // no prior gameweek counts as 0
        let second = settlements[1].result_for(1).unwrap();
        assert_eq!(second.net_score, -20);
        assert_eq!(second.change, -40);
    }

    #[test]
    fn test_late_joiner_sits_out_missing_gameweeks() {
        let histories = vec![
            history(1, &[(1, 60), (2, 120)]),
            history(2, &[(1, 50), (2, 90)]),
            history(3, &[(2, 70)]),
        ];
        let settlements = net_score_history(&histories);
        assert_eq!(settlements[0].results.len(), 2);
        assert!(settlements[0].result_for(3).is_none());
        assert_eq!(settlements[1].results.len(), 3);
        let joiner = settlements[1].result_for(3).unwrap();
        assert_eq!(joiner.change, joiner.net_score);
    }

    #[test]
    fn test_gameweek_with_single_member_skipped() {
        let histories = vec![
            history(1, &[(1, 60), (2, 120)]),
            history(2, &[(2, 90)]),
        ];
        let settlements = net_score_history(&histories);
        assert_eq!(settlements.len(), 1);
        assert_eq!(settlements[0].gameweek, 2);
    }

    #[test]
    fn test_empty_histories() {
        assert!(net_score_history(&[]).is_empty());
    }

    #[test]
    fn test_member_series_and_ranking() {
        let histories = vec![
            history(1, &[(1, 50), (2, 100)]),
            history(2, &[(1, 40), (2, 110)]),
        ];
        let settlements = net_score_history(&histories);
        assert_eq!(member_series(&settlements, 2), vec![(1, -20), (2, 20)]);
        let ranked = settlements[1].ranked();
        assert_eq!(ranked[0].member_id, 2);
    }
}
