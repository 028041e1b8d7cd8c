use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    Category, CategoryID, Exercise, ExerciseID, GroupLetter, Name, NewExercise, Outcome,
    ReadError, Schedule, Session, SessionID, Settings, WriteError, clamp_load,
};

/// The state document is read as raw JSON and only becomes an [`AppState`]
/// through [`crate::migrate`].
pub trait StateRepository {
    fn read_state(&self) -> Result<Option<Value>, ReadError>;
    fn write_state(&self, state: &AppState) -> Result<(), WriteError>;
}

/// Root persisted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    pub categories: Vec<Category>,
    pub exercises: Vec<Exercise>,
    pub sessions: Vec<Session>,
    pub settings: Settings,
    pub schedule: Schedule,
    /// Collections of older app versions, kept verbatim whatever their shape.
    /// Empty lists when absent.
    pub logs: Value,
    pub history: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            categories: vec![],
            exercises: vec![],
            sessions: vec![],
            settings: Settings::default(),
            schedule: Schedule::default(),
            logs: Value::Array(vec![]),
            history: Value::Array(vec![]),
            extra: Map::new(),
        }
    }
}

impl AppState {
    #[must_use]
    pub fn category(&self, id: &CategoryID) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == *id)
    }

    #[must_use]
    pub fn exercise(&self, id: &ExerciseID) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == *id)
    }

    #[must_use]
    pub fn session(&self, id: &SessionID) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == *id)
    }

    /// Catalog in presentation order. Exercises sharing a sort key keep their
    /// stored order.
    #[must_use]
    pub fn exercises_sorted(&self) -> Vec<&Exercise> {
        let mut exercises = self.exercises.iter().collect::<Vec<_>>();
        exercises.sort_by_key(|e| e.sort_order);
        exercises
    }

    /// Exercises that lose `id` when the category is removed.
    #[must_use]
    pub fn exercises_linked_to(&self, id: &CategoryID) -> Vec<&Exercise> {
        self.exercises_sorted()
            .into_iter()
            .filter(|e| e.category_ids.contains(id))
            .collect()
    }

    /// Exercises in any category tagged with one of `groups`, in presentation
    /// order.
    #[must_use]
    pub fn exercises_in_groups(&self, groups: &[GroupLetter]) -> Vec<&Exercise> {
        let categories = self
            .categories
            .iter()
            .filter(|c| groups.contains(&c.group_letter))
            .map(|c| &c.id)
            .collect::<BTreeSet<_>>();
        self.exercises_sorted()
            .into_iter()
            .filter(|e| e.belongs_to_any(&categories))
            .collect()
    }

    pub(crate) fn add_category(&mut self, name: Name, group_letter: GroupLetter) -> CategoryID {
        let id = CategoryID::generate();
        self.categories
            .push(Category::new(id.clone(), name, group_letter));
        id
    }

    pub(crate) fn update_category(
        &mut self,
        id: &CategoryID,
        name: Name,
        group_letter: GroupLetter,
    ) -> Outcome {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == *id) else {
            return Outcome::Ignored;
        };
        category.name = name.into();
        category.group_letter = group_letter;
        Outcome::Applied
    }

    /// Exercises are never deleted with their category; they only lose the
    /// reference and may end up orphaned.
    pub(crate) fn remove_category(&mut self, id: &CategoryID) -> Outcome {
        let count = self.categories.len();
        self.categories.retain(|c| c.id != *id);
        if self.categories.len() == count {
            return Outcome::Ignored;
        }
        for exercise in &mut self.exercises {
            exercise.category_ids.retain(|c| c != id);
        }
        Outcome::Applied
    }

    pub(crate) fn add_exercise(&mut self, exercise: NewExercise) -> ExerciseID {
        let id = ExerciseID::generate();
        let sort_order = self
            .exercises
            .iter()
            .map(|e| e.sort_order)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        self.exercises
            .push(exercise.into_exercise(id.clone(), sort_order));
        id
    }

    pub(crate) fn update_exercise(&mut self, mut exercise: Exercise) -> Outcome {
        let Some(stored) = self.exercises.iter_mut().find(|e| e.id == exercise.id) else {
            return Outcome::Ignored;
        };
        exercise.initial_load = clamp_load(exercise.initial_load);
        *stored = exercise;
        Outcome::Applied
    }

    pub(crate) fn remove_exercise(&mut self, id: &ExerciseID) -> Outcome {
        let count = self.exercises.len();
        self.exercises.retain(|e| e.id != *id);
        Outcome::from(self.exercises.len() != count)
    }

    /// Sets the sort key of every listed exercise to its position in `ids`.
    /// Unlisted exercises keep their key.
    pub(crate) fn reorder_exercises(&mut self, ids: &[ExerciseID]) -> Outcome {
        let mut outcome = Outcome::Ignored;
        for exercise in &mut self.exercises {
            if let Some(position) = ids.iter().position(|id| *id == exercise.id) {
                exercise.sort_order = u32::try_from(position).unwrap_or(u32::MAX);
                outcome = Outcome::Applied;
            }
        }
        outcome
    }

    pub(crate) fn remove_session(&mut self, id: &SessionID) -> Outcome {
        let count = self.sessions.len();
        self.sessions.retain(|s| s.id != *id);
        Outcome::from(self.sessions.len() != count)
    }
}
