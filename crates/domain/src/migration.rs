//! Conversion of any stored state document into the current [`AppState`].
//!
//! Three generations of documents exist in the wild:
//!
//! - v2: categories with `group`, exercises with a single `categoryId` and
//!   `targetSets`/`targetReps`, the weekly plan in `settings.groupSchedule`
//!   and sessions keyed by exercise with `weight` per set.
//! - v3: a top-level `schedule` with one group letter (or `null`) per day.
//! - current: multiple groups per day, `categoryIds`, `type` and `sortOrder`.
//!
//! Every rule only looks at its own field, so migrating a migrated document
//! changes nothing. Keys nobody knows about are carried along.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use log::{debug, warn};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    AppState, Category, CategoryID, Exercise, ExerciseID, ExerciseType, GroupLetter,
    MigrationError, Schedule, SeriesRecord, Session, SessionDetail, SessionID, lenient,
};

const DEFAULT_SETS: u32 = 3;
const DEFAULT_REPS: u32 = 10;

/// Fails only if the document is not an object or `categories`, `exercises`
/// or `sessions` is not a list. Callers fall back to [`AppState::default`]
/// then. Single unreadable entries are skipped.
pub fn migrate(document: Value) -> Result<AppState, MigrationError> {
    let Value::Object(mut document) = document else {
        return Err(MigrationError::NotAnObject);
    };

    let settings = settings(document.remove("settings"));
    let schedule = match document.remove("schedule") {
        Some(value) if !value.is_null() => schedule(value),
        _ => group_schedule(&settings).unwrap_or_default(),
    };
    let categories = entries::<RawCategory>(take_list(&mut document, "categories")?, "category")
        .map(|(index, raw)| raw.migrate(index))
        .collect::<Vec<_>>();
    let exercises = entries::<RawExercise>(take_list(&mut document, "exercises")?, "exercise")
        .map(|(index, raw)| raw.migrate(index))
        .collect::<Vec<_>>();
    let sessions = take_list(&mut document, "sessions")?
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| session(value, index, &exercises))
        .collect::<Vec<_>>();
    let logs = take_verbatim(&mut document, "logs");
    let history = take_verbatim(&mut document, "history");

    Ok(AppState {
        categories,
        exercises,
        sessions,
        settings: serde_json::from_value(Value::Object(settings))?,
        schedule,
        logs,
        history,
        extra: document,
    })
}

fn take_list(
    document: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Vec<Value>, MigrationError> {
    match document.remove(key) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(MigrationError::NotAList(key)),
    }
}

/// Entries that cannot be read are skipped. The index is the position in the
/// stored list, so fallback ids stay stable across migrations.
fn entries<T: DeserializeOwned>(
    values: Vec<Value>,
    kind: &'static str,
) -> impl Iterator<Item = (usize, T)> {
    values
        .into_iter()
        .enumerate()
        .filter_map(move |(index, value)| match serde_json::from_value(value) {
            Ok(raw) => Some((index, raw)),
            Err(err) => {
                warn!("skipping invalid {kind} {index}: {err}");
                None
            }
        })
}

/// Collections of older app versions are passed through in whatever shape
/// they were stored.
fn take_verbatim(document: &mut Map<String, Value>, key: &str) -> Value {
    match document.remove(key) {
        None | Some(Value::Null) => Value::Array(vec![]),
        Some(value) => value,
    }
}

/// Settings are merged key by key with the defaults when deserialized.
fn settings(value: Option<Value>) -> Map<String, Value> {
    let mut settings = match value {
        Some(Value::Object(settings)) => settings,
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!("replacing invalid settings: {other}");
            Map::new()
        }
    };
    if !settings.contains_key("restTimeSeconds")
        && let Some(rest_time) = settings.get("restTimerDefault").cloned()
    {
        debug!("using restTimerDefault as restTimeSeconds");
        settings.insert(String::from("restTimeSeconds"), rest_time);
    }
    settings
}

/// One stored weekday entry of the schedule, in any of its historical shapes.
#[derive(Debug, Clone, PartialEq)]
enum ScheduleDayValue {
    Empty,
    Single(String),
    Multiple(Vec<Value>),
    Invalid(Value),
}

impl From<Value> for ScheduleDayValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ScheduleDayValue::Empty,
            Value::String(group) => ScheduleDayValue::Single(group),
            Value::Array(groups) => ScheduleDayValue::Multiple(groups),
            other => ScheduleDayValue::Invalid(other),
        }
    }
}

impl ScheduleDayValue {
    fn groups(self) -> Vec<GroupLetter> {
        match self {
            ScheduleDayValue::Empty => vec![],
            ScheduleDayValue::Single(group) if group.is_empty() => vec![],
            ScheduleDayValue::Single(group) => group_letter(&Value::String(group))
                .into_iter()
                .collect(),
            ScheduleDayValue::Multiple(groups) => groups.iter().filter_map(group_letter).collect(),
            ScheduleDayValue::Invalid(value) => {
                warn!("ignoring invalid schedule entry: {value}");
                vec![]
            }
        }
    }
}

fn group_letter(value: &Value) -> Option<GroupLetter> {
    let group = value.as_str().and_then(|g| GroupLetter::from_str(g.trim()).ok());
    if group.is_none() {
        warn!("ignoring invalid group letter: {value}");
    }
    group
}

fn schedule(value: Value) -> Schedule {
    let days: Vec<(String, Value)> = match value {
        Value::Object(days) => days.into_iter().collect(),
        Value::Array(days) => days
            .into_iter()
            .enumerate()
            .map(|(index, groups)| (index.to_string(), groups))
            .collect(),
        other => {
            warn!("replacing invalid schedule: {other}");
            vec![]
        }
    };
    Schedule::from_days(days.into_iter().filter_map(|(day, groups)| {
        let day = day.trim().parse::<u8>().ok()?;
        Some((day, ScheduleDayValue::from(groups).groups()))
    }))
}

/// Converts the v2 mapping of group letter to English weekday name.
fn group_schedule(settings: &Map<String, Value>) -> Option<Schedule> {
    let group_schedule = settings.get("groupSchedule")?.as_object()?;
    debug!("converting groupSchedule into schedule");
    let mut schedule = Schedule::default();
    for (group, day) in group_schedule {
        let Ok(group) = GroupLetter::from_str(group) else {
            continue;
        };
        if let Some(weekday) = day.as_str().and_then(|d| d.parse::<Weekday>().ok()) {
            schedule.toggle(weekday, group);
        }
    }
    Some(schedule)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    id: Option<Value>,
    name: Option<Value>,
    group_letter: Option<Value>,
    group: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RawCategory {
    fn migrate(self, index: usize) -> Category {
        let group_letter = self
            .group_letter
            .iter()
            .chain(self.group.iter())
            .find_map(|g| g.as_str().and_then(|g| GroupLetter::from_str(g).ok()))
            .unwrap_or(GroupLetter::FIRST);
        Category {
            id: text(self.id.as_ref())
                .unwrap_or_else(|| format!("category-{index}"))
                .into(),
            name: text(self.name.as_ref()).unwrap_or_default(),
            group_letter,
            extra: self.extra,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExercise {
    id: Option<Value>,
    name: Option<Value>,
    category_ids: Option<Value>,
    category_id: Option<Value>,
    #[serde(rename = "type")]
    exercise_type: Option<Value>,
    sort_order: Option<Value>,
    default_sets: Option<Value>,
    target_sets: Option<Value>,
    default_reps: Option<Value>,
    target_reps: Option<Value>,
    initial_load: Option<Value>,
    view_url: Option<Value>,
    video_url: Option<Value>,
    notes: Option<Value>,
    note: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RawExercise {
    fn migrate(self, index: usize) -> Exercise {
        let category_ids = match (self.category_ids, self.category_id) {
            (Some(Value::Array(ids)), _) => ids.iter().filter_map(lenient::text).collect(),
            (Some(id), _) if !id.is_null() => text(Some(&id)).into_iter().collect(),
            (_, Some(id)) => text(Some(&id))
                .filter(|id| !id.is_empty())
                .into_iter()
                .collect(),
            _ => vec![],
        };
        Exercise {
            id: text(self.id.as_ref())
                .unwrap_or_else(|| format!("exercise-{index}"))
                .into(),
            name: text(self.name.as_ref()).unwrap_or_default(),
            category_ids: category_ids.into_iter().map(CategoryID::from).collect(),
            exercise_type: self
                .exercise_type
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|t| ExerciseType::from_str(t).ok())
                .unwrap_or_default(),
            sort_order: count(self.sort_order.as_ref()).unwrap_or(0),
            default_sets: count(self.default_sets.as_ref())
                .or_else(|| count(self.target_sets.as_ref()))
                .unwrap_or(DEFAULT_SETS),
            default_reps: count(self.default_reps.as_ref())
                .or_else(|| count(self.target_reps.as_ref()))
                .unwrap_or(DEFAULT_REPS),
            initial_load: self
                .initial_load
                .as_ref()
                .and_then(lenient::load)
                .unwrap_or(0.0),
            view_url: non_blank(self.view_url.as_ref()).or_else(|| non_blank(self.video_url.as_ref())),
            notes: non_blank(self.notes.as_ref()).or_else(|| non_blank(self.note.as_ref())),
            extra: self.extra,
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(lenient::text)
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    text(value).filter(|text| !text.trim().is_empty())
}

fn count(value: Option<&Value>) -> Option<u32> {
    value.and_then(lenient::count)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSession {
    Current(RawCurrentSession),
    Legacy(RawLegacySession),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCurrentSession {
    id: Option<Value>,
    date: Option<Value>,
    start_time: Option<Value>,
    end_time: Option<Value>,
    duration_minutes: Option<Value>,
    #[serde(rename = "volume")]
    _volume: Option<Value>,
    #[serde(rename = "totalSeries")]
    _total_series: Option<Value>,
    notes: Option<Value>,
    groups: Option<Vec<Value>>,
    details: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// v2 session: sets per exercise, including the ones never completed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLegacySession {
    id: Option<Value>,
    date: Option<Value>,
    start_time: Option<Value>,
    end_time: Option<Value>,
    duration_minutes: Option<Value>,
    #[serde(rename = "volume")]
    _volume: Option<Value>,
    #[serde(rename = "totalSeries")]
    _total_series: Option<Value>,
    notes: Option<Value>,
    note: Option<Value>,
    groups: Option<Vec<Value>>,
    exercises: Map<String, Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Stored `volume` and `totalSeries` are dropped and derived again from the
/// details. Sessions without any usable time are skipped.
fn session(value: Value, index: usize, exercises: &[Exercise]) -> Option<Session> {
    let raw = match serde_json::from_value::<RawSession>(value) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("skipping unrecognized session {index}: {err}");
            return None;
        }
    };

    let (id, date, start_time, end_time, duration_minutes, notes, groups, details, extra) =
        match raw {
            RawSession::Current(raw) => (
                raw.id,
                raw.date,
                raw.start_time,
                raw.end_time,
                raw.duration_minutes,
                raw.notes,
                raw.groups
                    .unwrap_or_default()
                    .iter()
                    .filter_map(group_letter)
                    .collect(),
                raw.details
                    .into_iter()
                    .filter_map(|detail| current_detail(detail, exercises))
                    .collect(),
                raw.extra,
            ),
            RawSession::Legacy(raw) => {
                debug!("converting v2 session {index}");
                (
                    raw.id,
                    raw.date,
                    raw.start_time,
                    raw.end_time,
                    raw.duration_minutes,
                    raw.notes.filter(|notes| !notes.is_null()).or(raw.note),
                    raw.groups
                        .unwrap_or_default()
                        .iter()
                        .filter_map(group_letter)
                        .collect(),
                    raw.exercises
                        .into_iter()
                        .filter_map(|(key, value)| legacy_detail(&key, &value, exercises))
                        .collect(),
                    raw.extra,
                )
            }
        };

    let date = date
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
    let Some(start_time) = start_time
        .as_ref()
        .and_then(lenient::timestamp)
        .or_else(|| date.and_then(midnight))
    else {
        warn!("skipping session {index} without start time");
        return None;
    };
    let end_time = end_time
        .as_ref()
        .and_then(lenient::timestamp)
        .unwrap_or(start_time);

    let mut session = Session::new(
        SessionID::from(text(id.as_ref()).unwrap_or_else(|| format!("session-{index}"))),
        start_time,
        end_time,
        text(notes.as_ref()).unwrap_or_default(),
        groups,
        details,
    );
    if let Some(date) = date {
        session.date = date;
    }
    if let Some(duration_minutes) = count(duration_minutes.as_ref()) {
        session.duration_minutes = duration_minutes;
    }
    session.extra = extra;
    Some(session)
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|time| time.and_utc())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetail {
    exercise_id: Option<Value>,
    exercise_name: Option<Value>,
    #[serde(rename = "type")]
    exercise_type: Option<Value>,
    series: Option<Vec<Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn current_detail(value: Value, exercises: &[Exercise]) -> Option<SessionDetail> {
    let raw = serde_json::from_value::<RawDetail>(value)
        .inspect_err(|err| warn!("skipping invalid session detail: {err}"))
        .ok()?;
    let exercise_id = ExerciseID::from(text(raw.exercise_id.as_ref())?);
    let exercise = exercises.iter().find(|e| e.id == exercise_id);
    Some(SessionDetail {
        exercise_name: text(raw.exercise_name.as_ref())
            .or_else(|| exercise.map(|e| e.name.clone()))
            .unwrap_or_else(|| exercise_id.to_string()),
        exercise_type: raw
            .exercise_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|t| ExerciseType::from_str(t).ok())
            .or_else(|| exercise.map(|e| e.exercise_type))
            .unwrap_or_default(),
        series: raw
            .series
            .unwrap_or_default()
            .iter()
            .map(|record| series_record(record, "load"))
            .collect(),
        exercise_id,
        extra: raw.extra,
    })
}

/// Keeps completed sets only. Exercises without any are left out, as they
/// would be when finishing a workout today.
fn legacy_detail(key: &str, value: &Value, exercises: &[Exercise]) -> Option<SessionDetail> {
    let exercise_id = ExerciseID::from(
        text(value.get("exerciseId")).unwrap_or_else(|| key.to_string()),
    );
    let series = value
        .get("sets")
        .and_then(Value::as_array)
        .map(|sets| {
            sets.iter()
                .filter(|set| set.get("completed").and_then(Value::as_bool) == Some(true))
                .map(|set| series_record(set, "weight"))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if series.is_empty() {
        return None;
    }
    Some(SessionDetail {
        exercise_name: exercises
            .iter()
            .find(|e| e.id == exercise_id)
            .map_or_else(|| exercise_id.to_string(), |e| e.name.clone()),
        exercise_id,
        exercise_type: ExerciseType::Strength,
        series,
        extra: Map::new(),
    })
}

fn series_record(value: &Value, load_key: &str) -> SeriesRecord {
    SeriesRecord {
        load: value
            .get(load_key)
            .or_else(|| value.get("load"))
            .and_then(lenient::load)
            .unwrap_or(0.0),
        reps: count(value.get("reps")).unwrap_or(0),
    }
}
