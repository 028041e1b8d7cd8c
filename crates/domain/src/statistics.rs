use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::{CategoryID, Exercise, ExerciseID, SeriesRecord, Session};

/// Sum of `load × reps`. Callers pass completed series only.
pub fn total_volume<S: Borrow<SeriesRecord>>(series: impl IntoIterator<Item = S>) -> f64 {
    series.into_iter().map(|s| s.borrow().volume()).sum()
}

pub fn total_series<S: Borrow<SeriesRecord>>(series: impl IntoIterator<Item = S>) -> u32 {
    u32::try_from(series.into_iter().count()).unwrap_or(u32::MAX)
}

/// Whole minutes between `start` and `end`, rounded down. Negative spans
/// (clock changes) count as zero.
#[must_use]
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    u32::try_from((end - start).num_minutes().max(0)).unwrap_or(u32::MAX)
}

/// Number of sessions per month of `year`, January first.
#[must_use]
pub fn sessions_per_month(sessions: &[Session], year: i32) -> [u32; 12] {
    let mut result = [0; 12];
    for session in sessions.iter().filter(|s| s.date.year() == year) {
        result[session.date.month0() as usize] += 1;
    }
    result
}

#[must_use]
pub fn duration_in_month(sessions: &[Session], year: i32, month: u32) -> Duration {
    sessions
        .iter()
        .filter(|s| s.date.year() == year && s.date.month() == month)
        .map(|s| (s.end_time - s.start_time).max(Duration::zero()))
        .sum()
}

#[must_use]
pub fn training_days_in_month(sessions: &[Session], year: i32, month: u32) -> usize {
    sessions
        .iter()
        .filter(|s| s.date.year() == year && s.date.month() == month)
        .map(|s| s.date)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Volume of the last `count` sessions, ordered by date.
#[must_use]
pub fn recent_volume(sessions: &[Session], count: usize) -> Vec<(NaiveDate, f64)> {
    let mut sessions = sessions.iter().collect::<Vec<_>>();
    sessions.sort_by_key(|s| s.date);
    let skip = sessions.len().saturating_sub(count);
    sessions
        .into_iter()
        .skip(skip)
        .map(|s| (s.date, s.volume()))
        .collect()
}

/// Heaviest completed load per session for one exercise, ordered by date.
#[must_use]
pub fn exercise_progression(
    sessions: &[Session],
    exercise_id: &ExerciseID,
) -> Vec<(NaiveDate, f64)> {
    let mut result = sessions
        .iter()
        .filter_map(|s| {
            s.detail(exercise_id).map(|detail| {
                (
                    s.date,
                    detail.series.iter().map(|r| r.load).fold(0.0, f64::max),
                )
            })
        })
        .collect::<Vec<_>>();
    result.sort_by_key(|(date, _)| *date);
    result
}

/// Completed series per category. Exercises without a category are counted
/// under `None`; exercises no longer in the catalog are skipped.
#[must_use]
pub fn series_per_category(
    sessions: &[Session],
    exercises: &[Exercise],
) -> BTreeMap<Option<CategoryID>, u32> {
    let mut result: BTreeMap<Option<CategoryID>, u32> = BTreeMap::new();
    for detail in sessions.iter().flat_map(Session::details) {
        let Some(exercise) = exercises.iter().find(|e| e.id == detail.exercise_id) else {
            continue;
        };
        let series = total_series(&detail.series);
        if exercise.category_ids.is_empty() {
            *result.entry(None).or_default() += series;
        }
        for category_id in &exercise.category_ids {
            *result.entry(Some(category_id.clone())).or_default() += series;
        }
    }
    result
}
