use chrono::{DateTime, Utc, Weekday};
use log::{debug, info};

use crate::{
    AUTO_FINISH_NOTE, AppState, CategoryID, Exercise, ExerciseID, ExerciseType, GroupLetter,
    Inactivity, LongSessionPolicy, Name, NewExercise, Performance, SeriesEntry, SeriesID,
    SeriesRecord, SeriesUpdate, Session, SessionDetail, SessionID, Settings, WorkoutDraft,
    overload,
};

/// Result of an engine operation. Operations that do not apply to the current
/// state are ignored instead of failing.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

impl From<bool> for Outcome {
    fn from(applied: bool) -> Self {
        if applied {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutStatus {
    Idle,
    Active,
}

/// Owner of the application state and of the at most one workout draft.
///
/// All mutation goes through these operations. Nothing here touches storage;
/// see [`crate::Service`] for the write-through wrapper.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tracker {
    state: AppState,
    draft: Option<WorkoutDraft>,
}

impl Tracker {
    #[must_use]
    pub fn new(state: AppState, draft: Option<WorkoutDraft>) -> Self {
        Self { state, draft }
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn draft(&self) -> Option<&WorkoutDraft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> WorkoutStatus {
        if self.draft.is_some() {
            WorkoutStatus::Active
        } else {
            WorkoutStatus::Idle
        }
    }

    #[must_use]
    pub fn last_performance(&self, exercise_id: &ExerciseID) -> Performance {
        overload::last_performance(&self.state.sessions, &self.state.exercises, exercise_id)
    }

    pub fn start_workout(&mut self, groups: Vec<GroupLetter>) -> Outcome {
        self.start_workout_at(groups, Utc::now())
    }

    /// Creates a draft with every exercise of the categories tagged with one of
    /// `groups`. Strength exercises get their default number of sets, seeded
    /// with the last performance.
    pub fn start_workout_at(&mut self, groups: Vec<GroupLetter>, now: DateTime<Utc>) -> Outcome {
        if self.draft.is_some() {
            debug!("workout already in progress");
            return Outcome::Ignored;
        }

        let mut draft = WorkoutDraft::new(now, groups);

        for exercise in self.state.exercises_in_groups(draft.selected_groups()) {
            match exercise.exercise_type {
                ExerciseType::Strength => {
                    let last = self.last_performance(&exercise.id);
                    draft.add_strength(
                        exercise.id.clone(),
                        (0..exercise.default_sets)
                            .map(|_| SeriesEntry::new(last.load, last.reps))
                            .collect(),
                    );
                }
                ExerciseType::Cardio => draft.add_cardio(exercise.id.clone()),
            }
        }

        info!(
            "started workout with {} exercises",
            draft.exercise_ids().count()
        );
        self.draft = Some(draft);
        Outcome::Applied
    }

    pub fn update_series(
        &mut self,
        exercise_id: &ExerciseID,
        series_id: &SeriesID,
        update: SeriesUpdate,
    ) -> Outcome {
        match &mut self.draft {
            Some(draft) => draft.update_series(exercise_id, series_id, update),
            None => Outcome::Ignored,
        }
    }

    pub fn update_all_series(&mut self, exercise_id: &ExerciseID, update: SeriesUpdate) -> Outcome {
        match &mut self.draft {
            Some(draft) => draft.update_all_series(exercise_id, update),
            None => Outcome::Ignored,
        }
    }

    /// Only applies to cardio exercises that are part of the draft.
    pub fn mark_cardio_complete(&mut self, exercise_id: &ExerciseID, completed: bool) -> Outcome {
        let is_cardio = self.state.exercise(exercise_id).is_some_and(Exercise::is_cardio);
        match &mut self.draft {
            Some(draft) if is_cardio && draft.contains(exercise_id) => {
                draft.mark_cardio_complete(exercise_id, completed);
                Outcome::Applied
            }
            _ => Outcome::Ignored,
        }
    }

    /// Changes the catalog, not the draft, so it is allowed in any state.
    pub fn reorder_exercises(&mut self, ids: &[ExerciseID]) -> Outcome {
        self.state.reorder_exercises(ids)
    }

    pub fn finish_workout(&mut self, notes: &str) -> Option<Session> {
        self.finish_workout_at(notes, Utc::now())
    }

    /// Commits the draft as a session and returns it.
    ///
    /// Only completed sets are recorded. Strength exercises without any are
    /// left out, and so are cardio exercises not marked complete. Details are
    /// in catalog order, strength before cardio. Exercises removed from the
    /// catalog during the workout are dropped.
    pub fn finish_workout_at(&mut self, notes: &str, now: DateTime<Utc>) -> Option<Session> {
        let draft = self.draft.take()?;
        let exercises = self.state.exercises_sorted();

        let strength = exercises
            .iter()
            .filter(|e| !e.is_cardio() && draft.contains(&e.id))
            .filter_map(|e| {
                let series = draft.completed_series(&e.id).collect::<Vec<_>>();
                (!series.is_empty()).then(|| detail(e, series))
            });
        let cardio = exercises
            .iter()
            .filter(|e| e.is_cardio() && draft.is_cardio_completed(&e.id))
            .map(|e| detail(e, vec![]));
        let details = strength.chain(cardio).collect::<Vec<_>>();

        let session = Session::new(
            SessionID::generate(),
            draft.start_time(),
            now,
            notes.to_string(),
            draft.selected_groups().to_vec(),
            details,
        );

        info!(
            "finished workout: {} series, volume {}",
            session.total_series(),
            session.volume()
        );
        self.state.sessions.push(session.clone());
        Some(session)
    }

    pub fn cancel_workout(&mut self) -> Outcome {
        let outcome = Outcome::from(self.draft.take().is_some());
        if outcome.is_applied() {
            info!("cancelled workout");
        }
        outcome
    }

    /// `None` while idle. Measured from [`WorkoutDraft::active_since`].
    #[must_use]
    pub fn check_inactivity(
        &self,
        policy: &LongSessionPolicy,
        prompted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Inactivity> {
        self.draft
            .as_ref()
            .map(|draft| policy.check(draft.active_since(), prompted_at, now))
    }

    pub fn confirm_active(&mut self) -> Outcome {
        self.confirm_active_at(Utc::now())
    }

    /// Answers the long-session prompt: the next prompt comes a full
    /// `warning_after` after `now`.
    pub fn confirm_active_at(&mut self, now: DateTime<Utc>) -> Outcome {
        match &mut self.draft {
            Some(draft) => {
                draft.confirm_active(now);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    /// Finishes the workout with [`AUTO_FINISH_NOTE`] once the long-session
    /// prompt went unanswered past its deadline.
    pub fn finish_if_expired(
        &mut self,
        policy: &LongSessionPolicy,
        prompted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        if self.check_inactivity(policy, prompted_at, now) != Some(Inactivity::Expired) {
            return None;
        }
        info!("finishing abandoned workout");
        self.finish_workout_at(AUTO_FINISH_NOTE, now)
    }

    pub fn add_category(&mut self, name: Name, group_letter: GroupLetter) -> CategoryID {
        self.state.add_category(name, group_letter)
    }

    pub fn update_category(
        &mut self,
        id: &CategoryID,
        name: Name,
        group_letter: GroupLetter,
    ) -> Outcome {
        self.state.update_category(id, name, group_letter)
    }

    pub fn remove_category(&mut self, id: &CategoryID) -> Outcome {
        self.state.remove_category(id)
    }

    pub fn add_exercise(&mut self, exercise: NewExercise) -> ExerciseID {
        self.state.add_exercise(exercise)
    }

    pub fn update_exercise(&mut self, exercise: Exercise) -> Outcome {
        self.state.update_exercise(exercise)
    }

    pub fn remove_exercise(&mut self, id: &ExerciseID) -> Outcome {
        self.state.remove_exercise(id)
    }

    pub fn remove_session(&mut self, id: &SessionID) -> Outcome {
        self.state.remove_session(id)
    }

    pub fn update_settings(&mut self, settings: Settings) -> Outcome {
        Outcome::from(std::mem::replace(&mut self.state.settings, settings) != self.state.settings)
    }

    pub fn toggle_schedule(&mut self, weekday: Weekday, group: GroupLetter) -> Outcome {
        self.state.schedule.toggle(weekday, group);
        Outcome::Applied
    }

    pub fn assign_group(&mut self, group: GroupLetter, weekday: Option<Weekday>) -> Outcome {
        self.state.schedule.assign_exclusive(group, weekday);
        Outcome::Applied
    }

    /// Replaces the whole state, e.g. after an import. A running workout is
    /// kept.
    pub fn replace_state(&mut self, state: AppState) {
        self.state = state;
    }

    /// Discards all data including the running workout.
    pub fn reset(&mut self) {
        self.state = AppState::default();
        self.draft = None;
    }
}

fn detail(exercise: &Exercise, series: Vec<SeriesRecord>) -> SessionDetail {
    SessionDetail {
        exercise_id: exercise.id.clone(),
        exercise_name: exercise.name.clone(),
        exercise_type: exercise.exercise_type,
        series,
        extra: serde_json::Map::new(),
    }
}
