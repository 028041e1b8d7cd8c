use std::cmp::Ordering;

use crate::{Exercise, ExerciseID, Session};

/// Load and repetitions of one set, used to pre-fill new series.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Performance {
    pub load: f64,
    pub reps: u32,
}

/// Looks up the most recent session containing the exercise and returns its
/// first recorded set. Sessions are append-only, so the last matching element
/// is the newest.
///
/// An exercise that was never performed falls back to its configured initial
/// load and default repetitions. A matching session without recorded sets
/// (cardio) yields zero load and repetitions.
#[must_use]
pub fn last_performance(
    sessions: &[Session],
    exercises: &[Exercise],
    exercise_id: &ExerciseID,
) -> Performance {
    if let Some(detail) = sessions.iter().rev().find_map(|s| s.detail(exercise_id)) {
        return detail
            .series
            .first()
            .map(|record| Performance {
                load: record.load,
                reps: record.reps,
            })
            .unwrap_or_default();
    }

    exercises
        .iter()
        .find(|e| e.id == *exercise_id)
        .map(|e| Performance {
            load: e.initial_load,
            reps: e.default_reps,
        })
        .unwrap_or_default()
}

/// Direction of a value compared to the last performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Same,
}

impl Trend {
    #[must_use]
    pub fn between(current: f64, previous: f64) -> Self {
        match current.partial_cmp(&previous) {
            Some(Ordering::Greater) => Trend::Up,
            Some(Ordering::Less) => Trend::Down,
            _ => Trend::Same,
        }
    }
}
