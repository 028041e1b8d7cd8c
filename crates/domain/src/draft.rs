use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ExerciseID, GroupLetter, Outcome, ReadError, SeriesRecord, WriteError, statistics};

pub trait DraftRepository {
    fn read_draft(&self) -> Result<Option<WorkoutDraft>, ReadError>;
    /// Writing `None` removes the stored draft.
    fn write_draft(&self, draft: Option<&WorkoutDraft>) -> Result<(), WriteError>;
}

/// The in-progress workout. Persisted separately from the committed state so
/// a restart mid-workout resumes with the same start time and series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    start_time: DateTime<Utc>,
    selected_groups: Vec<GroupLetter>,
    exercises: BTreeMap<ExerciseID, Vec<SeriesEntry>>,
    #[serde(default)]
    cardio_completed: BTreeMap<ExerciseID, bool>,
    /// Last answer to the long-session prompt.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    confirmed_at: Option<DateTime<Utc>>,
}

impl WorkoutDraft {
    pub(crate) fn new(start_time: DateTime<Utc>, selected_groups: Vec<GroupLetter>) -> Self {
        Self {
            start_time,
            selected_groups,
            exercises: BTreeMap::new(),
            cardio_completed: BTreeMap::new(),
            confirmed_at: None,
        }
    }

    pub(crate) fn add_strength(&mut self, exercise_id: ExerciseID, series: Vec<SeriesEntry>) {
        self.exercises.insert(exercise_id, series);
    }

    pub(crate) fn add_cardio(&mut self, exercise_id: ExerciseID) {
        self.exercises.insert(exercise_id.clone(), vec![]);
        self.cardio_completed.insert(exercise_id, false);
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Start of the current activity period: the start time, or the last
    /// time the user confirmed they are still training.
    #[must_use]
    pub fn active_since(&self) -> DateTime<Utc> {
        self.confirmed_at.unwrap_or(self.start_time)
    }

    pub(crate) fn confirm_active(&mut self, now: DateTime<Utc>) {
        self.confirmed_at = Some(now);
    }

    #[must_use]
    pub fn selected_groups(&self) -> &[GroupLetter] {
        &self.selected_groups
    }

    pub fn exercise_ids(&self) -> impl Iterator<Item = &ExerciseID> {
        self.exercises.keys()
    }

    #[must_use]
    pub fn contains(&self, exercise_id: &ExerciseID) -> bool {
        self.exercises.contains_key(exercise_id)
    }

    #[must_use]
    pub fn series(&self, exercise_id: &ExerciseID) -> &[SeriesEntry] {
        self.exercises
            .get(exercise_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_cardio_completed(&self, exercise_id: &ExerciseID) -> bool {
        self.cardio_completed
            .get(exercise_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn completed_series(&self, exercise_id: &ExerciseID) -> impl Iterator<Item = SeriesRecord> {
        self.series(exercise_id)
            .iter()
            .filter(|s| s.completed)
            .map(SeriesEntry::record)
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        statistics::total_volume(self.all_completed_series())
    }

    #[must_use]
    pub fn total_completed_series(&self) -> u32 {
        statistics::total_series(self.all_completed_series())
    }

    #[must_use]
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> u32 {
        statistics::duration_minutes(self.start_time, now)
    }

    fn all_completed_series(&self) -> impl Iterator<Item = SeriesRecord> {
        self.exercises
            .values()
            .flatten()
            .filter(|s| s.completed)
            .map(SeriesEntry::record)
    }

    pub(crate) fn update_series(
        &mut self,
        exercise_id: &ExerciseID,
        series_id: &SeriesID,
        update: SeriesUpdate,
    ) -> Outcome {
        let Some(entry) = self
            .exercises
            .get_mut(exercise_id)
            .and_then(|series| series.iter_mut().find(|s| s.id == *series_id))
        else {
            return Outcome::Ignored;
        };
        update.apply(entry);
        Outcome::Applied
    }

    pub(crate) fn update_all_series(
        &mut self,
        exercise_id: &ExerciseID,
        update: SeriesUpdate,
    ) -> Outcome {
        match self.exercises.get_mut(exercise_id) {
            Some(series) if !series.is_empty() => {
                for entry in series {
                    update.apply(entry);
                }
                Outcome::Applied
            }
            _ => Outcome::Ignored,
        }
    }

    pub(crate) fn mark_cardio_complete(&mut self, exercise_id: &ExerciseID, completed: bool) {
        self.cardio_completed.insert(exercise_id.clone(), completed);
    }
}

/// One attempt at an exercise. Only lives inside a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub id: SeriesID,
    pub load: f64,
    pub reps: u32,
    pub completed: bool,
}

impl SeriesEntry {
    #[must_use]
    pub fn new(load: f64, reps: u32) -> Self {
        Self {
            id: SeriesID::generate(),
            load: clamp_load(load),
            reps,
            completed: false,
        }
    }

    #[must_use]
    pub fn record(&self) -> SeriesRecord {
        SeriesRecord {
            load: self.load,
            reps: self.reps,
        }
    }
}

/// Partial update of a series entry; `None` fields are left unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SeriesUpdate {
    pub load: Option<f64>,
    pub reps: Option<u32>,
    pub completed: Option<bool>,
}

impl SeriesUpdate {
    #[must_use]
    pub fn load(load: f64) -> Self {
        Self {
            load: Some(load),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reps(reps: u32) -> Self {
        Self {
            reps: Some(reps),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    fn apply(self, entry: &mut SeriesEntry) {
        if let Some(load) = self.load {
            entry.load = clamp_load(load);
        }
        if let Some(reps) = self.reps {
            entry.reps = reps;
        }
        if let Some(completed) = self.completed {
            entry.completed = completed;
        }
    }
}

/// Loads are finite and never negative. `NaN` and infinities become zero.
#[must_use]
pub fn clamp_load(load: f64) -> f64 {
    if load.is_finite() { load.max(0.0) } else { 0.0 }
}

#[derive(
    Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeriesID(String);

impl SeriesID {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for SeriesID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
