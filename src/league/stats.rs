//! Descriptive statistics for the form view.
//!
//! None of these feed the settlement. Every function returns a finite value
//! (or `None`) so nothing downstream has to handle NaN.

use serde::Serialize;
use statrs::statistics::Statistics;

use super::history::{member_series, GameweekSettlement};
use super::types::{MemberHistory, MemberId};

/// Oscillator value reported when there is no movement to measure
pub const NEUTRAL_RSI: f64 = 50.0;

/// Gameweeks in the short moving average shown in the form table
pub const FORM_WINDOW: usize = 3;

/// Gameweeks in the net score oscillator
pub const RSI_WINDOW: usize = 5;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = values.iter().mean();
    m.is_finite().then_some(m)
}

/// Sample standard deviation (n - 1 denominator).
///
/// `None` below two samples, where the statistic is undefined.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sd = values.iter().std_dev();
    sd.is_finite().then_some(sd)
}

/// Trailing simple moving average, one value per input.
///
/// Early entries average over however many values exist so far.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Relative strength of a series with Wilder smoothing, 0..=100.
///
/// The first `window` changes seed the average gain and loss; every later
/// change folds in as `(prev * (window - 1) + change) / window`. A series
/// shorter than the window averages all of its changes. Flat or too-short
/// series report [`NEUTRAL_RSI`]; a series with gains and no losses reports
/// 100 instead of dividing by a zero loss average.
pub fn relative_strength_index(series: &[f64], window: usize) -> f64 {
    if series.len() < 2 {
        return NEUTRAL_RSI;
    }

    let window = window.max(1);
    let changes: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = changes.split_at(window.min(changes.len()));

    let count = seed.len() as f64;
    let mut avg_gain = seed.iter().map(|c| c.max(0.0)).sum::<f64>() / count;
    let mut avg_loss = seed.iter().map(|c| (-c).max(0.0)).sum::<f64>() / count;

    let w = window as f64;
    for change in rest {
        avg_gain = (avg_gain * (w - 1.0) + change.max(0.0)) / w;
        avg_loss = (avg_loss * (w - 1.0) + (-change).max(0.0)) / w;
    }

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Summary of one member's season so far
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberForm {
    pub member_id: MemberId,
    pub display_name: String,
    pub gameweeks: usize,
    pub mean_points: f64,
    pub std_dev: Option<f64>,
    pub best_gameweek: Option<(u32, i64)>,
    pub recent_average: f64, // FORM_WINDOW-gameweek moving average of points
    pub net_rsi: f64,        // oscillator over settled net scores
}

pub fn member_form(history: &MemberHistory, settlements: &[GameweekSettlement]) -> MemberForm {
    let deltas = history.deltas();

    let best_gameweek = history
        .periods
        .iter()
        .max_by(|a, b| a.points.cmp(&b.points).then(b.gameweek.cmp(&a.gameweek)))
        .map(|p| (p.gameweek, p.points));

    let net_series: Vec<f64> = member_series(settlements, history.member.id)
        .into_iter()
        .map(|(_, net)| net as f64)
        .collect();

    MemberForm {
        member_id: history.member.id,
        display_name: history.member.display_name.clone(),
        gameweeks: history.periods.len(),
        mean_points: mean(&deltas).unwrap_or(0.0),
        std_dev: sample_std_dev(&deltas),
        best_gameweek,
        recent_average: moving_average(&deltas, FORM_WINDOW)
            .last()
            .copied()
            .unwrap_or(0.0),
        net_rsi: relative_strength_index(&net_series, RSI_WINDOW),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::history::net_score_history;
    use crate::league::types::{Member, PeriodScore};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn test_std_dev_needs_two_samples() {
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(sample_std_dev(&[42.0]), None);
    }

    #[test]
    fn test_sample_std_dev() {
        // Sample variance of [2, 4, 4, 4, 5, 5, 7, 9] is 32 / 7
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(sd, (32.0_f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_std_dev_constant_series_is_zero() {
        assert_eq!(sample_std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_moving_average_warms_up() {
        let ma = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(ma, vec![3.0, 4.5, 6.0, 9.0]);
    }

    #[test]
    fn test_moving_average_zero_window_is_identity() {
        assert_eq!(moving_average(&[1.0, 2.0], 0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_rsi_short_series_is_neutral() {
        assert_eq!(relative_strength_index(&[], 5), NEUTRAL_RSI);
        assert_eq!(relative_strength_index(&[10.0], 5), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        assert_eq!(relative_strength_index(&[4.0, 4.0, 4.0], 5), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_only_gains_guards_zero_loss() {
        assert_eq!(relative_strength_index(&[1.0, 2.0, 5.0], 5), 100.0);
    }

    #[test]
    fn test_rsi_only_losses() {
        assert_eq!(relative_strength_index(&[5.0, 2.0, 1.0], 5), 0.0);
    }

    #[test]
    fn test_rsi_mixed() {
        // changes +10, -5: avg gain 5, avg loss 2.5, rs 2
        let rsi = relative_strength_index(&[0.0, 10.0, 5.0], 5);
        assert!(approx(rsi, 100.0 - 100.0 / 3.0));
    }

    #[test]
    fn test_rsi_smooths_changes_after_seed_window() {
        // changes +10, -4 seed gain 5 and loss 2; +2 then gives
        // gain (5 + 2) / 2 = 3.5 and loss (2 + 0) / 2 = 1
        let rsi = relative_strength_index(&[0.0, 10.0, 6.0, 8.0], 2);
        assert!(approx(rsi, 100.0 - 100.0 / 4.5));
    }

    #[test]
    fn test_rsi_window_of_one_follows_last_change() {
        // With a window of 1 each change replaces the previous averages
        assert_eq!(relative_strength_index(&[0.0, 50.0, 49.0], 1), 0.0);
        assert_eq!(relative_strength_index(&[50.0, 0.0, 1.0], 1), 100.0);
    }

    #[test]
    fn test_rsi_earlier_losses_decay_but_linger() {
        // A simple trailing average over the last two changes would see only
        // gains and report 100; the smoothed loss keeps it below that
        let rsi = relative_strength_index(&[100.0, 0.0, 10.0, 20.0], 2);
        assert!(rsi > 0.0 && rsi < 100.0, "rsi = {}", rsi);
    }

    #[test]
    fn test_member_form() {
        let periods = vec![
            PeriodScore { gameweek: 1, member_id: 1, total: 50, points: 50 },
            PeriodScore { gameweek: 2, member_id: 1, total: 120, points: 70 },
            PeriodScore { gameweek: 3, member_id: 1, total: 150, points: 30 },
        ];
        let other = vec![
            PeriodScore { gameweek: 1, member_id: 2, total: 60, points: 60 },
            PeriodScore { gameweek: 2, member_id: 2, total: 110, points: 50 },
            PeriodScore { gameweek: 3, member_id: 2, total: 170, points: 60 },
        ];
        let histories = vec![
            MemberHistory::new(Member::new(1, "A", "TA"), periods),
            MemberHistory::new(Member::new(2, "B", "TB"), other),
        ];
        let settlements = net_score_history(&histories);
        let form = member_form(&histories[0], &settlements);

        assert_eq!(form.gameweeks, 3);
        assert!(approx(form.mean_points, 50.0));
        assert_eq!(form.best_gameweek, Some((2, 70)));
        assert!(approx(form.recent_average, 50.0));
        assert!(form.std_dev.unwrap() > 0.0);
        assert!((0.0..=100.0).contains(&form.net_rsi));
    }

    #[test]
    fn test_member_form_without_history() {
        let history = MemberHistory::new(Member::new(1, "A", "TA"), vec![]);
        let form = member_form(&history, &[]);
        assert_eq!(form.mean_points, 0.0);
        assert_eq!(form.std_dev, None);
        assert_eq!(form.best_gameweek, None);
        assert_eq!(form.net_rsi, NEUTRAL_RSI);
    }
}
