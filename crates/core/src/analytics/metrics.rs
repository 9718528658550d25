//! Rolling sleep metrics: descriptive statistics, daily totals, and derived
//! 0-100 scores.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{local_view, SleepSample, MIN_DURATION_MINUTES};
use crate::types::Timestamp;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_TARGET_HOURS: f64 = 7.0;

/// Mean / sample standard deviation / min / max, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub avg: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerSleepMetrics {
    /// Hours per session.
    pub duration: DescriptiveStats,
    /// Quality ratings (1-10).
    pub quality: DescriptiveStats,
    /// Bedtime as local minutes after midnight.
    pub bedtime: DescriptiveStats,
    pub sleep_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyOverallMetrics {
    pub days_count: usize,
    /// Total slept hours per local day.
    pub total_daily_hours: DescriptiveStats,
    pub target_hours: f64,
    pub days_meeting_target: usize,
    /// Percentage of days meeting the target, 1 decimal.
    pub daily_sufficiency_score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedScores {
    pub consistency_score: f64,
    pub sufficiency_score: f64,
    pub overall_sleep_score: f64,
}

/// Metrics over one time window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowMetrics {
    pub from: Timestamp,
    pub to: Timestamp,
    pub per_sleep: PerSleepMetrics,
    pub daily_overall: DailyOverallMetrics,
    pub scores: DerivedScores,
}

/// Compute all metrics for the sessions in `[from, to]`.
///
/// The caller is responsible for fetching exactly the sessions whose
/// `end_at` falls inside the window.
pub fn compute_window(samples: &[SleepSample], from: Timestamp, to: Timestamp) -> WindowMetrics {
    let per_sleep = per_sleep_metrics(samples);
    let daily_overall = daily_overall_metrics(samples);
    let scores = derived_scores(&per_sleep, &daily_overall);

    WindowMetrics {
        from,
        to,
        per_sleep,
        daily_overall,
        scores,
    }
}

fn per_sleep_metrics(samples: &[SleepSample]) -> PerSleepMetrics {
    let mut durations = Vec::new();
    let mut qualities = Vec::new();
    let mut bedtimes = Vec::new();

    for sample in samples {
        let view = local_view(sample);
        if view.duration_minutes < MIN_DURATION_MINUTES {
            continue;
        }
        durations.push(view.duration_minutes as f64 / 60.0);
        qualities.push(f64::from(sample.quality));
        bedtimes.push(view.bedtime_minutes as f64);
    }

    let mut result = PerSleepMetrics {
        sleep_count: durations.len(),
        ..PerSleepMetrics::default()
    };
    if !durations.is_empty() {
        result.duration = compute_stats(&durations);
        result.quality = compute_stats(&qualities);
        result.bedtime = compute_stats(&bedtimes);
    }
    result
}

fn daily_overall_metrics(samples: &[SleepSample]) -> DailyOverallMetrics {
    let mut result = DailyOverallMetrics {
        target_hours: DEFAULT_TARGET_HOURS,
        ..DailyOverallMetrics::default()
    };
    if samples.is_empty() {
        return result;
    }

    // Group by the local date of end_at; naps and the night sleep of the
    // same day sum together.
    let mut daily_totals: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for sample in samples {
        let view = local_view(sample);
        *daily_totals.entry(view.local_date).or_insert(0.0) += view.duration_minutes as f64 / 60.0;
    }

    let totals: Vec<f64> = daily_totals.values().copied().collect();
    let days_meeting_target = totals
        .iter()
        .filter(|&&t| t >= DEFAULT_TARGET_HOURS)
        .count();

    result.days_count = totals.len();
    result.total_daily_hours = compute_stats(&totals);
    result.days_meeting_target = days_meeting_target;
    if result.days_count > 0 {
        result.daily_sufficiency_score =
            round1(days_meeting_target as f64 / result.days_count as f64 * 100.0);
    }
    result
}

/// Derived 0-100 scores.
///
/// Consistency maps a bedtime std of 0-120 minutes onto 100-0; sufficiency
/// maps an average duration of 5-9 hours onto 0-100; overall is the
/// weighted blend 0.4 / 0.3 / 0.3 with daily sufficiency.
fn derived_scores(per_sleep: &PerSleepMetrics, daily: &DailyOverallMetrics) -> DerivedScores {
    let mut scores = DerivedScores::default();

    if per_sleep.sleep_count > 0 {
        let bedtime_std = per_sleep.bedtime.std.min(120.0);
        scores.consistency_score = round1((1.0 - bedtime_std / 120.0) * 100.0).max(0.0);

        let avg_duration = per_sleep.duration.avg;
        scores.sufficiency_score = if avg_duration < 5.0 {
            0.0
        } else if avg_duration >= 9.0 {
            100.0
        } else {
            round1((avg_duration - 5.0) / 4.0 * 100.0)
        };
    }

    scores.overall_sleep_score = round1(
        scores.consistency_score * 0.4
            + scores.sufficiency_score * 0.3
            + daily.daily_sufficiency_score * 0.3,
    );
    scores
}

fn compute_stats(values: &[f64]) -> DescriptiveStats {
    if values.is_empty() {
        return DescriptiveStats::default();
    }

    let sum: f64 = values.iter().sum();
    let avg = sum / values.len() as f64;

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let std = if values.len() > 1 {
        let sum_squares: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
        (sum_squares / (values.len() - 1) as f64).sqrt()
    } else {
        0.0
    };

    DescriptiveStats {
        avg: round2(avg),
        std: round2(std),
        min: round2(min),
        max: round2(max),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
