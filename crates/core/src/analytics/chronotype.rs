//! Chronotype classification from mid-sleep times.
//!
//! The chronotype is the median mid-sleep time (in local minutes after
//! midnight) across a window of sessions. Mid-sleep before 02:30 local is an
//! early bird, before 04:30 intermediate, anything later a night owl.

use serde::Serialize;

use super::{local_view, SleepSample, MIN_DURATION_MINUTES};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_MIN_SLEEPS: usize = 7;

/// Mid-sleep earlier than 150 minutes after midnight (02:30).
pub const EARLY_BIRD_THRESHOLD: i64 = 150;
/// Mid-sleep earlier than 270 minutes after midnight (04:30).
pub const INTERMEDIATE_THRESHOLD: i64 = 270;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chronotype {
    EarlyBird,
    Intermediate,
    NightOwl,
    Unknown,
}

/// Chronotype analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct ChronotypeResult {
    pub chronotype: Chronotype,
    /// Median mid-sleep as local `HH:MM`; empty when unknown.
    pub mid_sleep_local_time: String,
    pub mid_sleep_minutes_after_midnight: i64,
    pub window_days: i64,
    pub sleeps_used: usize,
}

/// Classify a user's chronotype from the sessions in the window.
///
/// Sessions shorter than [`MIN_DURATION_MINUTES`] are skipped. Fewer than
/// `min_sleeps` usable sessions yields [`Chronotype::Unknown`] rather than a
/// low-confidence classification.
pub fn compute(samples: &[SleepSample], window_days: i64, min_sleeps: usize) -> ChronotypeResult {
    let mid_minutes: Vec<i64> = samples
        .iter()
        .map(local_view)
        .filter(|v| v.duration_minutes >= MIN_DURATION_MINUTES)
        .map(|v| v.mid_sleep_minutes)
        .collect();

    if mid_minutes.len() < min_sleeps {
        return ChronotypeResult {
            chronotype: Chronotype::Unknown,
            mid_sleep_local_time: String::new(),
            mid_sleep_minutes_after_midnight: 0,
            window_days,
            sleeps_used: mid_minutes.len(),
        };
    }

    let median_mid = median(&mid_minutes);
    ChronotypeResult {
        chronotype: classify(median_mid),
        mid_sleep_local_time: minutes_to_time_string(median_mid),
        mid_sleep_minutes_after_midnight: median_mid,
        window_days,
        sleeps_used: mid_minutes.len(),
    }
}

pub fn classify(mid_minutes: i64) -> Chronotype {
    if mid_minutes < EARLY_BIRD_THRESHOLD {
        Chronotype::EarlyBird
    } else if mid_minutes < INTERMEDIATE_THRESHOLD {
        Chronotype::Intermediate
    } else {
        Chronotype::NightOwl
    }
}

fn median(values: &[i64]) -> i64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2
    } else {
        sorted[n / 2]
    }
}

/// Format minutes after midnight as `HH:MM`, wrapping into one day.
fn minutes_to_time_string(minutes: i64) -> String {
    let minutes = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
