use serde::Serialize;
use tracing::warn;

use super::net_score::{net_scores_f64, MIN_MEMBERS};
use super::stats::sample_std_dev;
use super::types::{MemberHistory, MemberId};
use crate::error::LeagueError;

/// z-value of a two-sided 95% band
pub const Z_95: f64 = 1.96;

/// Default number of trailing gameweeks in the trend
pub const DEFAULT_TREND_WINDOW: usize = 5;

/// Projected end-of-season position of one member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub member_id: MemberId,
    pub display_name: String,
    pub current_total: i64,
    pub weighted_average: f64,
    pub std_dev: Option<f64>,
    pub remaining: u32,
    pub projected_final_total: f64,
    pub margin: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub projected_final_net_score: i64,
}

/// Linearly weighted mean of the trailing `window` values.
///
/// The most recent value gets weight `k`, the oldest in the window weight 1,
/// where `k = min(window, len)`. Empty input averages to 0.
pub fn weighted_recent_average(values: &[f64], window: usize) -> f64 {
    let k = window.min(values.len());
    if k == 0 {
        return 0.0;
    }

    let recent = &values[values.len() - k..];
    let weighted: f64 = recent
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i + 1) as f64)
        .sum();
    let weight_total = (k * (k + 1) / 2) as f64;

    weighted / weight_total
}

/// Half-width of the band around a projection `remaining` gameweeks out.
///
/// Zero when nothing remains, and an undefined or negative sigma counts as
/// zero spread.
pub fn projection_margin(sigma: f64, remaining: u32) -> f64 {
    if remaining == 0 || !sigma.is_finite() || sigma <= 0.0 {
        return 0.0;
    }
    Z_95 * sigma * (remaining as f64).sqrt()
}

/// Trend and band for a single member; the net score is filled in by
/// [`project_league`] once every member's final total is known.
pub fn project_member(history: &MemberHistory, remaining: u32, window: usize) -> Projection {
    let deltas = history.deltas();
    let current_total = history.current_total();
    let weighted_average = weighted_recent_average(&deltas, window);
    let std_dev = sample_std_dev(&deltas);

    let projected_final_total = current_total as f64 + weighted_average * remaining as f64;
    let margin = projection_margin(std_dev.unwrap_or(0.0), remaining);

    Projection {
        member_id: history.member.id,
        display_name: history.member.display_name.clone(),
        current_total,
        weighted_average,
        std_dev,
        remaining,
        projected_final_total,
        margin,
        lower_bound: projected_final_total - margin,
        upper_bound: projected_final_total + margin,
        projected_final_net_score: 0,
    }
}

/// Project every member to `target_gameweek` and settle the projected totals.
///
/// Members without a record for `current_gameweek` are left out. The net
/// scores are settled in floating point and rounded, so their sum may drift
/// from zero by at most one per member.
pub fn project_league(
    histories: &[MemberHistory],
    current_gameweek: u32,
    target_gameweek: u32,
    window: usize,
) -> Result<Vec<Projection>, LeagueError> {
    let remaining = target_gameweek.saturating_sub(current_gameweek);

    let mut projections: Vec<Projection> = histories
        .iter()
        .filter(|h| {
            let present = h.at(current_gameweek).is_some();
            if !present {
                warn!(
                    member = %h.member.display_name,
                    gameweek = current_gameweek,
                    "no record for current gameweek, leaving out of projection"
                );
            }
            present
        })
        .map(|h| project_member(h, remaining, window))
        .collect();

    if projections.len() < MIN_MEMBERS {
        return Err(LeagueError::InsufficientMembers {
            found: projections.len(),
        });
    }

    let totals: Vec<f64> = projections.iter().map(|p| p.projected_final_total).collect();
    for (projection, net) in projections.iter_mut().zip(net_scores_f64(&totals)) {
        projection.projected_final_net_score = net.round() as i64;
    }

    projections.sort_by(|a, b| {
        b.projected_final_net_score
            .cmp(&a.projected_final_net_score)
            .then(a.member_id.cmp(&b.member_id))
    });

    Ok(projections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::types::{Member, PeriodScore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn history(id: u64, points: &[i64]) -> MemberHistory {
        let mut total = 0;
        let periods = points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                total += p;
                PeriodScore {
                    gameweek: i as u32 + 1,
                    member_id: id,
                    total,
                    points: p,
                }
            })
            .collect();
        MemberHistory::new(Member::new(id, format!("M{}", id), "T"), periods)
    }

    #[test]
    fn test_weighted_average_full_window() {
        // (10*1 + 20*2 + 30*3 + 40*4 + 50*5) / 15
        let avg = weighted_recent_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 5);
        assert!((avg - 550.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_uses_trailing_values() {
        // Only the last two count: (3*1 + 5*2) / 3
        let avg = weighted_recent_average(&[100.0, 3.0, 5.0], 2);
        assert!((avg - 13.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_short_history() {
        // Fewer periods than the window: weights 1..=2
        let avg = weighted_recent_average(&[60.0, 30.0], 5);
        assert!((avg - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_empty() {
        assert_eq!(weighted_recent_average(&[], 5), 0.0);
    }

    #[test]
    fn test_margin_zero_when_nothing_remains() {
        assert_eq!(projection_margin(12.5, 0), 0.0);
    }

    #[test]
    fn test_margin_non_decreasing_in_remaining() {
        let mut last = 0.0;
        for t in 0..=38 {
            let margin = projection_margin(9.0, t);
            assert!(margin >= last);
            last = margin;
        }
    }

    #[test]
    fn test_margin_neutral_for_degenerate_sigma() {
        assert_eq!(projection_margin(f64::NAN, 10), 0.0);
        assert_eq!(projection_margin(-1.0, 10), 0.0);
        assert_eq!(projection_margin(0.0, 10), 0.0);
    }

    #[test]
    fn test_margin_value() {
        assert!((projection_margin(10.0, 4) - 39.2).abs() < 1e-9);
    }

    #[test]
    fn test_project_member() {
        let h = history(1, &[50, 60, 70]);
        let p = project_member(&h, 10, 5);
        let avg = (50.0 + 120.0 + 210.0) / 6.0;
        assert_eq!(p.current_total, 180);
        assert!((p.projected_final_total - (180.0 + avg * 10.0)).abs() < 1e-9);
        assert!(p.lower_bound < p.projected_final_total);
        assert!(p.upper_bound > p.projected_final_total);
    }

    #[test]
    fn test_single_gameweek_member_has_no_band() {
        let p = project_member(&history(1, &[64]), 37, 5);
        assert_eq!(p.std_dev, None);
        assert_eq!(p.margin, 0.0);
        assert_eq!(p.lower_bound, p.upper_bound);
        assert!(p.projected_final_total.is_finite());
    }

    #[test]
    fn test_no_remaining_keeps_current_total() {
        let h = history(1, &[50, 60]);
        let p = project_member(&h, 0, 5);
        assert_eq!(p.projected_final_total, 110.0);
        assert_eq!(p.margin, 0.0);
    }

    #[test]
    fn test_league_projection_at_target_matches_current_settlement() {
        let histories = vec![history(1, &[50, 50]), history(2, &[40, 40]), history(3, &[30, 30])];
        let projections = project_league(&histories, 2, 2, 5).unwrap();
        let nets: Vec<(u64, i64)> = projections
            .iter()
            .map(|p| (p.member_id, p.projected_final_net_score))
            .collect();
        assert_eq!(nets, vec![(1, 120), (2, 0), (3, -120)]);
    }

    #[test]
    fn test_target_before_current_saturates() {
        let histories = vec![history(1, &[50, 50]), history(2, &[40, 40])];
        let projections = project_league(&histories, 2, 1, 5).unwrap();
        assert!(projections.iter().all(|p| p.remaining == 0));
    }

    #[test]
    fn test_projection_drift_bounded_by_member_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(2..=30);
            let gameweeks = rng.gen_range(1..=20);
            let histories: Vec<MemberHistory> = (0..n)
                .map(|id| {
                    let points: Vec<i64> = (0..gameweeks).map(|_| rng.gen_range(0..=120)).collect();
                    history(id as u64, &points)
                })
                .collect();
            let projections = project_league(&histories, gameweeks as u32, 38, 5).unwrap();
            let drift: i64 = projections.iter().map(|p| p.projected_final_net_score).sum();
            assert!(drift.unsigned_abs() <= n as u64, "drift {} for {} members", drift, n);
        }
    }

    #[test]
    fn test_members_missing_current_gameweek_left_out() {
        let histories = vec![
            history(1, &[50, 50, 50]),
            history(2, &[40, 40, 40]),
            history(3, &[30, 30]),
        ];
        let projections = project_league(&histories, 3, 38, 5).unwrap();
        assert_eq!(projections.len(), 2);
        assert!(projections.iter().all(|p| p.member_id != 3));
    }

    #[test]
    fn test_projection_needs_two_members() {
        let histories = vec![history(1, &[50])];
        assert_eq!(
            project_league(&histories, 1, 38, 5),
            Err(LeagueError::InsufficientMembers { found: 1 })
        );
    }
}
