use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{ExerciseID, ExerciseType, GroupLetter, statistics};

/// A committed workout.
///
/// `volume` and `total_series` are derived from `details` on construction and
/// cannot be edited independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionID,
    pub date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    volume: f64,
    total_series: u32,
    pub notes: String,
    pub groups: Vec<GroupLetter>,
    details: Vec<SessionDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    #[must_use]
    pub fn new(
        id: SessionID,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        notes: String,
        groups: Vec<GroupLetter>,
        details: Vec<SessionDetail>,
    ) -> Self {
        Self {
            id,
            date: end_time.date_naive(),
            start_time,
            end_time,
            duration_minutes: statistics::duration_minutes(start_time, end_time),
            volume: statistics::total_volume(details.iter().flat_map(|d| d.series.iter())),
            total_series: statistics::total_series(details.iter().flat_map(|d| d.series.iter())),
            notes,
            groups,
            details,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[must_use]
    pub fn total_series(&self) -> u32 {
        self.total_series
    }

    #[must_use]
    pub fn details(&self) -> &[SessionDetail] {
        &self.details
    }

    #[must_use]
    pub fn detail(&self, exercise_id: &ExerciseID) -> Option<&SessionDetail> {
        self.details.iter().find(|d| d.exercise_id == *exercise_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub exercise_id: ExerciseID,
    /// Name at commit time, kept for display after renames and deletions.
    pub exercise_name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    /// Completed sets only. Always empty for cardio.
    pub series: Vec<SeriesRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub load: f64,
    pub reps: u32,
}

impl SeriesRecord {
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.load * f64::from(self.reps)
    }
}

#[derive(
    Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionID(String);

impl SessionID {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for SessionID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn detail(exercise_id: &str, series: &[(f64, u32)]) -> SessionDetail {
        SessionDetail {
            exercise_id: exercise_id.into(),
            exercise_name: exercise_id.to_uppercase(),
            exercise_type: if series.is_empty() {
                ExerciseType::Cardio
            } else {
                ExerciseType::Strength
            },
            series: series
                .iter()
                .map(|(load, reps)| SeriesRecord {
                    load: *load,
                    reps: *reps,
                })
                .collect(),
            extra: Map::new(),
        }
    }

    fn session() -> Session {
        Session::new(
            "s1".into(),
            Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 19, 12, 59).unwrap(),
            String::from("ok"),
            vec![GroupLetter::A, GroupLetter::C],
            vec![
                detail("e1", &[(20.0, 10), (22.5, 8)]),
                detail("e2", &[]),
                detail("e3", &[(0.0, 15)]),
            ],
        )
    }

    #[test]
    fn test_session_new_derives_aggregates() {
        let session = session();

        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(session.duration_minutes, 72);
        assert_approx_eq!(session.volume(), 380.0);
        assert_eq!(session.total_series(), 3);
    }

    #[test]
    fn test_session_volume_matches_details() {
        let session = session();
        let recomputed: f64 = session
            .details()
            .iter()
            .flat_map(|d| d.series.iter())
            .map(SeriesRecord::volume)
            .sum();

        assert_approx_eq!(session.volume(), recomputed);
    }

    #[test]
    fn test_session_detail() {
        let session = session();

        assert_eq!(session.detail(&"e3".into()).map(|d| d.series.len()), Some(1));
        assert_eq!(session.detail(&"e9".into()), None);
    }

    #[test]
    fn test_session_serialize() {
        let value = serde_json::to_value(session()).unwrap();

        assert_eq!(value["date"], json!("2024-03-04"));
        assert_eq!(value["startTime"], json!(1_709_575_200_000_i64));
        assert_eq!(value["durationMinutes"], json!(72));
        assert_eq!(value["totalSeries"], json!(3));
        assert_eq!(value["groups"], json!(["A", "C"]));
        assert_eq!(
            value["details"][1],
            json!({"exerciseId": "e2", "exerciseName": "E2", "type": "cardio", "series": []})
        );
    }
}
