use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

pub const DEFAULT_REST_TIME_SECONDS: u32 = 60;

/// User preferences stored inside the state document. Keys written by other
/// app versions are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_auto_timer", deserialize_with = "auto_timer")]
    pub auto_timer: bool,
    #[serde(
        default = "default_rest_time_seconds",
        deserialize_with = "rest_time_seconds"
    )]
    pub rest_time_seconds: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_timer: default_auto_timer(),
            rest_time_seconds: default_rest_time_seconds(),
            extra: Map::new(),
        }
    }
}

fn default_auto_timer() -> bool {
    true
}

fn default_rest_time_seconds() -> u32 {
    DEFAULT_REST_TIME_SECONDS
}

fn auto_timer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|value| value.as_bool().unwrap_or_else(default_auto_timer))
}

fn rest_time_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Value::deserialize(deserializer)
        .map(|value| lenient::count(&value).unwrap_or_else(default_rest_time_seconds))
}
