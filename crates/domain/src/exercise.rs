use std::collections::BTreeSet;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::EnumString;
use uuid::Uuid;

use crate::{CategoryID, Name, clamp_load};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: String,
    /// May be empty: an exercise whose categories were all deleted stays usable.
    pub category_ids: Vec<CategoryID>,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    /// Sort key only. Values are not required to be contiguous.
    pub sort_order: u32,
    pub default_sets: u32,
    pub default_reps: u32,
    pub initial_load: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    #[must_use]
    pub fn is_cardio(&self) -> bool {
        self.exercise_type == ExerciseType::Cardio
    }

    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.category_ids.is_empty()
    }

    #[must_use]
    pub fn belongs_to_any(&self, categories: &BTreeSet<&CategoryID>) -> bool {
        self.category_ids.iter().any(|id| categories.contains(id))
    }
}

/// Input for adding an exercise to the catalog. The id and sort order are
/// assigned on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: Name,
    pub category_ids: Vec<CategoryID>,
    pub exercise_type: ExerciseType,
    pub default_sets: u32,
    pub default_reps: u32,
    pub initial_load: f64,
    pub view_url: Option<String>,
    pub notes: Option<String>,
}

impl NewExercise {
    #[must_use]
    pub fn into_exercise(self, id: ExerciseID, sort_order: u32) -> Exercise {
        Exercise {
            id,
            name: self.name.into(),
            category_ids: self.category_ids,
            exercise_type: self.exercise_type,
            sort_order,
            default_sets: self.default_sets,
            default_reps: self.default_reps,
            initial_load: clamp_load(self.initial_load),
            view_url: self.view_url.filter(|url| !url.trim().is_empty()),
            notes: self.notes.filter(|notes| !notes.trim().is_empty()),
            extra: Map::new(),
        }
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExerciseType {
    #[default]
    Strength,
    Cardio,
}

#[derive(
    Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExerciseID(String);

impl ExerciseID {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for ExerciseID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExerciseID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn exercise() -> Exercise {
        Exercise {
            id: "e1".into(),
            name: String::from("Supino reto"),
            category_ids: vec!["c1".into(), "c2".into()],
            exercise_type: ExerciseType::Strength,
            sort_order: 3,
            default_sets: 3,
            default_reps: 10,
            initial_load: 20.0,
            view_url: None,
            notes: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_exercise_serde() {
        let value = json!({
            "id": "e1",
            "name": "Supino reto",
            "categoryIds": ["c1", "c2"],
            "type": "strength",
            "sortOrder": 3,
            "defaultSets": 3,
            "defaultReps": 10,
            "initialLoad": 20.0
        });

        assert_eq!(serde_json::to_value(exercise()).unwrap(), value);
        assert_eq!(serde_json::from_value::<Exercise>(value).unwrap(), exercise());
    }

    #[rstest]
    #[case(&["c1"], true)]
    #[case(&["c2", "c9"], true)]
    #[case(&["c9"], false)]
    #[case(&[], false)]
    fn test_exercise_belongs_to_any(#[case] categories: &[&str], #[case] expected: bool) {
        let ids = categories
            .iter()
            .map(|c| CategoryID::from(*c))
            .collect::<Vec<_>>();
        assert_eq!(exercise().belongs_to_any(&ids.iter().collect::<BTreeSet<_>>()), expected);
    }

    #[test]
    fn test_exercise_is_orphaned() {
        let mut exercise = exercise();
        assert!(!exercise.is_orphaned());
        exercise.category_ids.clear();
        assert!(exercise.is_orphaned());
    }

    #[test]
    fn test_new_exercise_into_exercise() {
        let new_exercise = NewExercise {
            name: Name::new(" Esteira ").unwrap(),
            category_ids: vec!["c3".into()],
            exercise_type: ExerciseType::Cardio,
            default_sets: 0,
            default_reps: 0,
            initial_load: -5.0,
            view_url: Some(String::from("  ")),
            notes: Some(String::from("20 min")),
        };

        let exercise = new_exercise.into_exercise("e7".into(), 4);

        assert_eq!(exercise.name, "Esteira");
        assert_eq!(exercise.sort_order, 4);
        assert!(exercise.is_cardio());
        assert_eq!(exercise.initial_load, 0.0);
        assert_eq!(exercise.view_url, None);
        assert_eq!(exercise.notes.as_deref(), Some("20 min"));
    }

    #[rstest]
    #[case("strength", Some(ExerciseType::Strength))]
    #[case("cardio", Some(ExerciseType::Cardio))]
    #[case("mobility", None)]
    fn test_exercise_type_from_str(#[case] value: &str, #[case] expected: Option<ExerciseType>) {
        assert_eq!(ExerciseType::from_str(value).ok(), expected);
    }
}
