use chrono::{DateTime, NaiveDate, Utc, Weekday};
use log::{debug, error, info, warn};

use crate::{
    AppState, CategoryID, DraftRepository, Exercise, ExerciseID, Export, GroupLetter, ImportError,
    LongSessionPolicy, Name, NewExercise, Outcome, ReadError, SeriesID, SeriesUpdate, Session,
    SessionID, Settings, StateRepository, Tracker, WorkoutDraft, WriteError, migrate, transfer,
};

/// Binds a [`Tracker`] to a repository. Every applied change is written
/// through immediately: the state document after catalog and history
/// changes, the draft document after workout changes.
///
/// The in-memory state is updated before writing, so a failed write is
/// reported but does not roll anything back.
pub struct Service<R> {
    repository: R,
    tracker: Tracker,
}

macro_rules! log_on_error {
    ($result: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $result;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::Unavailable) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R> Service<R>
where
    R: StateRepository + DraftRepository,
{
    /// Reads, repairs and writes back the stored state, and resumes a stored
    /// draft. Unreadable documents are replaced by defaults.
    pub fn load(repository: R) -> Self {
        let (state, write_back) =
            match log_on_error!(repository.read_state(), ReadError, "read", "state") {
                Ok(Some(document)) => match migrate(document) {
                    Ok(state) => (state, true),
                    Err(err) => {
                        error!("discarding corrupt state: {err}");
                        (AppState::default(), false)
                    }
                },
                Ok(None) => {
                    info!("no stored state found");
                    (AppState::default(), true)
                }
                Err(_) => (AppState::default(), false),
            };

        let draft = match repository.read_draft() {
            Ok(draft) => draft,
            Err(err) => {
                warn!("discarding unreadable draft: {err}");
                None
            }
        };
        if draft.is_some() {
            info!("resuming workout in progress");
        }

        let service = Self {
            repository,
            tracker: Tracker::new(state, draft),
        };
        if write_back {
            let _ = service.write_state(Outcome::Applied);
        }
        service
    }

    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        self.tracker.state()
    }

    #[must_use]
    pub fn draft(&self) -> Option<&WorkoutDraft> {
        self.tracker.draft()
    }

    #[must_use]
    pub fn into_repository(self) -> R {
        self.repository
    }

    pub fn start_workout(&mut self, groups: Vec<GroupLetter>) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.start_workout(groups);
        self.write_draft(outcome)
    }

    pub fn update_series(
        &mut self,
        exercise_id: &ExerciseID,
        series_id: &SeriesID,
        update: SeriesUpdate,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.update_series(exercise_id, series_id, update);
        self.write_draft(outcome)
    }

    pub fn update_all_series(
        &mut self,
        exercise_id: &ExerciseID,
        update: SeriesUpdate,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.update_all_series(exercise_id, update);
        self.write_draft(outcome)
    }

    pub fn mark_cardio_complete(
        &mut self,
        exercise_id: &ExerciseID,
        completed: bool,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.mark_cardio_complete(exercise_id, completed);
        self.write_draft(outcome)
    }

    pub fn reorder_exercises(&mut self, ids: &[ExerciseID]) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.reorder_exercises(ids);
        self.write_state(outcome)
    }

    pub fn finish_workout(&mut self, notes: &str) -> Result<Option<Session>, WriteError> {
        let session = self.tracker.finish_workout(notes);
        self.commit(session)
    }

    pub fn finish_if_expired(
        &mut self,
        policy: &LongSessionPolicy,
        prompted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, WriteError> {
        let session = self.tracker.finish_if_expired(policy, prompted_at, now);
        self.commit(session)
    }

    pub fn confirm_active(&mut self) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.confirm_active();
        self.write_draft(outcome)
    }

    pub fn cancel_workout(&mut self) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.cancel_workout();
        self.write_draft(outcome)
    }

    pub fn add_category(
        &mut self,
        name: Name,
        group_letter: GroupLetter,
    ) -> Result<CategoryID, WriteError> {
        let id = self.tracker.add_category(name, group_letter);
        self.write_state(Outcome::Applied)?;
        Ok(id)
    }

    pub fn update_category(
        &mut self,
        id: &CategoryID,
        name: Name,
        group_letter: GroupLetter,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.update_category(id, name, group_letter);
        self.write_state(outcome)
    }

    pub fn remove_category(&mut self, id: &CategoryID) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.remove_category(id);
        self.write_state(outcome)
    }

    pub fn add_exercise(&mut self, exercise: NewExercise) -> Result<ExerciseID, WriteError> {
        let id = self.tracker.add_exercise(exercise);
        self.write_state(Outcome::Applied)?;
        Ok(id)
    }

    pub fn update_exercise(&mut self, exercise: Exercise) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.update_exercise(exercise);
        self.write_state(outcome)
    }

    pub fn remove_exercise(&mut self, id: &ExerciseID) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.remove_exercise(id);
        self.write_state(outcome)
    }

    pub fn remove_session(&mut self, id: &SessionID) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.remove_session(id);
        self.write_state(outcome)
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.update_settings(settings);
        self.write_state(outcome)
    }

    pub fn toggle_schedule(
        &mut self,
        weekday: Weekday,
        group: GroupLetter,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.toggle_schedule(weekday, group);
        self.write_state(outcome)
    }

    pub fn assign_group(
        &mut self,
        group: GroupLetter,
        weekday: Option<Weekday>,
    ) -> Result<Outcome, WriteError> {
        let outcome = self.tracker.assign_group(group, weekday);
        self.write_state(outcome)
    }

    pub fn export(&self, today: NaiveDate) -> Result<Export, serde_json::Error> {
        transfer::export(self.tracker.state(), today)
    }

    /// Replaces the state with a backup. Nothing changes if the backup is
    /// rejected.
    pub fn import(&mut self, text: &str) -> Result<(), ImportError> {
        let state = transfer::import(text).inspect_err(|err| warn!("rejected import: {err}"))?;
        info!(
            "imported {} categories, {} exercises and {} sessions",
            state.categories.len(),
            state.exercises.len(),
            state.sessions.len()
        );
        self.tracker.replace_state(state);
        self.write_state(Outcome::Applied)?;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), WriteError> {
        info!("resetting all data");
        self.tracker.reset();
        self.write_state(Outcome::Applied)?;
        self.write_draft(Outcome::Applied)?;
        Ok(())
    }

    fn commit(&self, session: Option<Session>) -> Result<Option<Session>, WriteError> {
        let outcome = Outcome::from(session.is_some());
        self.write_state(outcome)?;
        self.write_draft(outcome)?;
        Ok(session)
    }

    fn write_state(&self, outcome: Outcome) -> Result<Outcome, WriteError> {
        if outcome.is_applied() {
            log_on_error!(
                self.repository.write_state(self.tracker.state()),
                WriteError,
                "write",
                "state"
            )?;
        }
        Ok(outcome)
    }

    fn write_draft(&self, outcome: Outcome) -> Result<Outcome, WriteError> {
        if outcome.is_applied() {
            log_on_error!(
                self.repository.write_draft(self.tracker.draft()),
                WriteError,
                "write",
                "draft"
            )?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use crate::StorageError;

    use super::*;

    #[derive(Default)]
    struct FakeRepository {
        state: RefCell<Option<Value>>,
        draft: RefCell<Option<WorkoutDraft>>,
        state_writes: Cell<usize>,
        unavailable: Cell<bool>,
        corrupt_draft: Cell<bool>,
    }

    impl FakeRepository {
        fn with_state(state: Value) -> Self {
            Self {
                state: RefCell::new(Some(state)),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), StorageError> {
            if self.unavailable.get() {
                Err(StorageError::Unavailable)
            } else {
                Ok(())
            }
        }
    }

    impl StateRepository for FakeRepository {
        fn read_state(&self) -> Result<Option<Value>, ReadError> {
            self.check()?;
            Ok(self.state.borrow().clone())
        }

        fn write_state(&self, state: &AppState) -> Result<(), WriteError> {
            self.check()?;
            *self.state.borrow_mut() =
                Some(serde_json::to_value(state).map_err(StorageError::from)?);
            self.state_writes.set(self.state_writes.get() + 1);
            Ok(())
        }
    }

    impl DraftRepository for FakeRepository {
        fn read_draft(&self) -> Result<Option<WorkoutDraft>, ReadError> {
            self.check()?;
            if self.corrupt_draft.get() {
                return Err(ReadError::Other("invalid draft".into()));
            }
            Ok(self.draft.borrow().clone())
        }

        fn write_draft(&self, draft: Option<&WorkoutDraft>) -> Result<(), WriteError> {
            self.check()?;
            *self.draft.borrow_mut() = draft.cloned();
            Ok(())
        }
    }

    fn document() -> Value {
        json!({
            "categories": [{"id": "c1", "name": "Peito", "group": "A"}],
            "exercises": [{
                "id": "e1",
                "name": "Supino",
                "categoryId": "c1",
                "defaultSets": 2,
                "defaultReps": 10,
                "initialLoad": 20
            }],
            "schedule": {"1": "A"}
        })
    }

    #[test]
    fn test_load_repairs_and_writes_back() {
        let service = Service::load(FakeRepository::with_state(document()));

        assert_eq!(service.repository.state_writes.get(), 1);
        let stored = service.repository.state.borrow().clone().unwrap();
        assert_eq!(stored["categories"][0]["groupLetter"], json!("A"));
        assert_eq!(stored["exercises"][0]["categoryIds"], json!(["c1"]));
        assert_eq!(stored["schedule"]["1"], json!(["A"]));
        assert_eq!(migrate(stored).unwrap(), *service.state());
    }

    #[test]
    fn test_load_keeps_data_next_to_odd_legacy_collections() {
        let mut document = document();
        document["history"] = json!({"2024-03-04": "s1"});
        let mut service = Service::load(FakeRepository::with_state(document));

        service
            .add_category(Name::new("Costas").unwrap(), GroupLetter::B)
            .unwrap();

        let stored = service.repository.state.borrow().clone().unwrap();
        assert_eq!(stored["categories"].as_array().map(Vec::len), Some(2));
        assert_eq!(stored["exercises"][0]["id"], json!("e1"));
        assert_eq!(stored["history"], json!({"2024-03-04": "s1"}));
    }

    #[test]
    fn test_load_without_stored_state() {
        let service = Service::load(FakeRepository::default());

        assert_eq!(*service.state(), AppState::default());
        assert_eq!(service.repository.state_writes.get(), 1);
    }

    #[test]
    fn test_load_corrupt_state() {
        let service = Service::load(FakeRepository::with_state(json!(["not", "an", "object"])));

        assert_eq!(*service.state(), AppState::default());
        assert_eq!(service.repository.state_writes.get(), 0);
    }

    #[test]
    fn test_load_unavailable_storage() {
        let repository = FakeRepository::with_state(document());
        repository.unavailable.set(true);

        let service = Service::load(repository);

        assert_eq!(*service.state(), AppState::default());
        assert_eq!(service.draft(), None);
    }

    #[test]
    fn test_load_discards_unreadable_draft() {
        let repository = FakeRepository::with_state(document());
        repository.corrupt_draft.set(true);

        let service = Service::load(repository);

        assert_eq!(service.draft(), None);
        assert_eq!(service.state().exercises.len(), 1);
    }

    #[test]
    fn test_draft_survives_restart() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        assert_eq!(service.start_workout(vec![GroupLetter::A]).unwrap(), Outcome::Applied);
        let series_id = service.draft().unwrap().series(&"e1".into())[0].id.clone();
        assert_eq!(
            service
                .update_series(&"e1".into(), &series_id, SeriesUpdate::completed(true))
                .unwrap(),
            Outcome::Applied
        );
        let draft = service.draft().cloned();

        let resumed = Service::load(service.repository);

        assert_eq!(resumed.draft().cloned(), draft);
        assert!(resumed.draft().unwrap().series(&"e1".into())[0].completed);
    }

    #[test]
    fn test_finish_workout_writes_session_and_clears_draft() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        let _ = service.start_workout(vec![GroupLetter::A]).unwrap();
        let _ = service
            .update_all_series(&"e1".into(), SeriesUpdate::completed(true))
            .unwrap();

        let session = service.finish_workout("ok").unwrap().unwrap();

        assert_eq!(session.total_series(), 2);
        assert_eq!(*service.repository.draft.borrow(), None);
        let stored = service.repository.state.borrow().clone().unwrap();
        assert_eq!(stored["sessions"][0]["volume"], json!(400.0));
        assert_eq!(service.finish_workout("again").unwrap(), None);
    }

    #[test]
    fn test_ignored_operations_do_not_write() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        let writes = service.repository.state_writes.get();

        assert_eq!(service.cancel_workout().unwrap(), Outcome::Ignored);
        assert_eq!(service.remove_exercise(&"e9".into()).unwrap(), Outcome::Ignored);
        assert_eq!(service.reorder_exercises(&[]).unwrap(), Outcome::Ignored);
        assert_eq!(service.repository.state_writes.get(), writes);
    }

    #[test]
    fn test_failed_write_is_reported() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        service.repository.unavailable.set(true);

        assert!(matches!(
            service.remove_category(&"c1".into()),
            Err(WriteError::Storage(StorageError::Unavailable))
        ));
        assert!(service.state().categories.is_empty());
    }

    #[test]
    fn test_catalog_changes_are_written() {
        let mut service = Service::load(FakeRepository::default());

        let category_id = service
            .add_category(Name::new("Costas").unwrap(), GroupLetter::B)
            .unwrap();
        let _ = service.assign_group(GroupLetter::B, Some(Weekday::Wed)).unwrap();

        let stored = service.repository.state.borrow().clone().unwrap();
        assert_eq!(stored["categories"][0]["id"], json!(category_id.to_string()));
        assert_eq!(stored["schedule"]["3"], json!(["B"]));
    }

    #[test]
    fn test_import() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        let before = service.state().clone();

        assert!(matches!(
            service.import(r#"{"categories": [], "exercises": []}"#),
            Err(ImportError::MissingField("categories"))
        ));
        assert_eq!(*service.state(), before);

        let backup = json!({
            "categories": [{"id": "c7", "name": "Pernas", "groupLetter": "C"}],
            "exercises": [{"id": "e7", "name": "Agachamento", "categoryIds": ["c7"]}]
        });
        service.import(&backup.to_string()).unwrap();

        assert_eq!(service.state().categories[0].id, "c7".into());
        let stored = service.repository.state.borrow().clone().unwrap();
        assert_eq!(stored["exercises"][0]["id"], json!("e7"));
    }

    #[test]
    fn test_export() {
        let service = Service::load(FakeRepository::with_state(document()));

        let export = service
            .export(NaiveDate::from_ymd_opt(2024, 10, 5).unwrap())
            .unwrap();

        assert_eq!(export.file_name, "meu-dia-de-treino-backup-2024-10-05.json");
        assert_eq!(
            transfer::import(&export.contents).unwrap(),
            *service.state()
        );
    }

    #[test]
    fn test_reset() {
        let mut service = Service::load(FakeRepository::with_state(document()));
        let _ = service.start_workout(vec![GroupLetter::A]).unwrap();

        service.reset().unwrap();

        assert_eq!(*service.tracker(), Tracker::default());
        assert_eq!(*service.repository.draft.borrow(), None);
        assert_eq!(
            migrate(service.repository.state.borrow().clone().unwrap()).unwrap(),
            AppState::default()
        );
    }
}
