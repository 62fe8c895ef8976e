//! Zero-sum net score settlement.
//!
//! Every pair of members stakes their point difference, doubled. Summing a
//! member's stakes against everyone else collapses to a closed form:
//!
//! ```text
//! net_i = (x_i * (n - 1) - (S - x_i)) * 2
//! ```
//!
//! where `S` is the sum of all totals. Each `x_i - x_j` term is cancelled by
//! its mirror `x_j - x_i`, so the scores of one settlement always sum to zero.

use super::types::{NetScoreRow, Standing};
use crate::error::LeagueError;

/// Fewest members for which a settlement is meaningful
pub const MIN_MEMBERS: usize = 2;

/// Net score for every total, in input order. O(n).
///
/// An empty slice yields an empty result and a single member scores 0.
pub fn net_scores(totals: &[i64]) -> Vec<i64> {
    let n = totals.len() as i64;
    let sum: i64 = totals.iter().sum();
    totals
        .iter()
        .map(|&x| (x * (n - 1) - (sum - x)) * 2)
        .collect()
}

/// Head-to-head form of [`net_scores`]: twice the sum of pairwise differences
/// against every other member. O(n²).
pub fn pairwise_net_scores(totals: &[i64]) -> Vec<i64> {
    totals
        .iter()
        .enumerate()
        .map(|(i, &x_i)| {
            let stakes: i64 = totals
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, &x_j)| x_i - x_j)
                .sum();
            stakes * 2
        })
        .collect()
}

/// Closed form over fractional totals, used for projected standings
pub fn net_scores_f64(totals: &[f64]) -> Vec<f64> {
    let n = totals.len() as f64;
    let sum: f64 = totals.iter().sum();
    totals
        .iter()
        .map(|&x| (x * (n - 1.0) - (sum - x)) * 2.0)
        .collect()
}

/// Settle the current standings.
///
/// Fails with [`LeagueError::InsufficientMembers`] when fewer than
/// [`MIN_MEMBERS`] remain after exclusions.
pub fn settle(standings: &[Standing]) -> Result<Vec<NetScoreRow>, LeagueError> {
    if standings.len() < MIN_MEMBERS {
        return Err(LeagueError::InsufficientMembers {
            found: standings.len(),
        });
    }

    let totals: Vec<i64> = standings.iter().map(|s| s.total).collect();
    let rows = standings
        .iter()
        .zip(net_scores(&totals))
        .map(|(standing, net_score)| NetScoreRow {
            member: standing.member.clone(),
            rank: standing.rank,
            total: standing.total,
            net_difference: net_score / 2,
            net_score,
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::types::Member;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn standing(id: u64, total: i64) -> Standing {
        Standing {
            member: Member::new(id, format!("M{}", id), format!("T{}", id)),
            rank: id as u32,
            total,
        }
    }

    #[test]
    fn test_three_member_scenario() {
        assert_eq!(net_scores(&[100, 80, 60]), vec![120, 0, -120]);
    }

    #[test]
    fn test_single_member_scores_zero() {
        assert_eq!(net_scores(&[100]), vec![0]);
        assert_eq!(pairwise_net_scores(&[100]), vec![0]);
    }

    #[test]
    fn test_empty_roster() {
        assert!(net_scores(&[]).is_empty());
    }

    #[test]
    fn test_two_members_swap() {
        assert_eq!(net_scores(&[70, 50]), vec![40, -40]);
        assert_eq!(net_scores(&[50, 70]), vec![-40, 40]);
    }

    #[test]
    fn test_equal_totals_all_zero() {
        assert_eq!(net_scores(&[55, 55, 55, 55]), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_sum_random_rosters() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let n = rng.gen_range(1..=50);
            let totals: Vec<i64> = (0..n).map(|_| rng.gen_range(0..=3000)).collect();
            let scores = net_scores(&totals);
            assert_eq!(scores.iter().sum::<i64>(), 0, "totals: {:?}", totals);
        }
    }

    #[test]
    fn test_closed_form_matches_pairwise_oracle() {
        let mut rng = StdRng::seed_from_u64(38);
        for _ in 0..500 {
            let n = rng.gen_range(1..=50);
            let totals: Vec<i64> = (0..n).map(|_| rng.gen_range(0..=3000)).collect();
            assert_eq!(net_scores(&totals), pairwise_net_scores(&totals));
        }
    }

    #[test]
    fn test_swapping_two_totals_swaps_their_scores() {
        let mut rng = StdRng::seed_from_u64(0x5a9);
        for _ in 0..500 {
            let n = rng.gen_range(3..=50);
            let totals: Vec<i64> = (0..n).map(|_| rng.gen_range(0..=3000)).collect();
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);

            let mut swapped = totals.clone();
            swapped.swap(i, j);

            let before = net_scores(&totals);
            let after = net_scores(&swapped);

            assert_eq!(after[i], before[j], "totals: {:?}", totals);
            assert_eq!(after[j], before[i], "totals: {:?}", totals);
            for k in (0..n).filter(|&k| k != i && k != j) {
                assert_eq!(after[k], before[k], "member {} moved, totals: {:?}", k, totals);
            }
        }
    }

    #[test]
    fn test_self_inclusion_does_not_change_pairwise_sum() {
        // Counting a member against itself adds x_i - x_i = 0
        let totals = [412, 388, 401, 350];
        let with_self: Vec<i64> = totals
            .iter()
            .map(|&x_i| totals.iter().map(|&x_j| x_i - x_j).sum::<i64>() * 2)
            .collect();
        assert_eq!(with_self, net_scores(&totals));
    }

    #[test]
    fn test_decreasing_totals_are_deterministic() {
        // Not monotonic across calls, but the same input settles the same way
        let totals = [90, 120, 30];
        assert_eq!(net_scores(&totals), net_scores(&totals));
        assert_eq!(net_scores(&totals).iter().sum::<i64>(), 0);
    }

    #[test]
    fn test_f64_form_matches_integer_form() {
        let ints = [100, 80, 60, 33];
        let floats: Vec<f64> = ints.iter().map(|&x| x as f64).collect();
        let expected: Vec<f64> = net_scores(&ints).iter().map(|&x| x as f64).collect();
        assert_eq!(net_scores_f64(&floats), expected);
    }

    #[test]
    fn test_settle_rows() {
        let rows = settle(&[standing(1, 100), standing(2, 80), standing(3, 60)]).unwrap();
        let nets: Vec<i64> = rows.iter().map(|r| r.net_score).collect();
        assert_eq!(nets, vec![120, 0, -120]);
        let differences: Vec<i64> = rows.iter().map(|r| r.net_difference).collect();
        assert_eq!(differences, vec![60, 0, -60]);
        assert_eq!(rows[0].member.id, 1);
        assert_eq!(rows[2].total, 60);
    }

    #[test]
    fn test_settle_rejects_single_member() {
        assert_eq!(
            settle(&[standing(1, 100)]),
            Err(LeagueError::InsufficientMembers { found: 1 })
        );
    }

    #[test]
    fn test_settle_rejects_empty_roster() {
        assert_eq!(
            settle(&[]),
            Err(LeagueError::InsufficientMembers { found: 0 })
        );
    }
}
