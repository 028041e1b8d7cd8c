//! Readers for scalar values in stored documents. Older app versions wrote
//! numbers as floats, integers or strings depending on the input widget.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::clamp_load;

/// Identifiers and labels. Numbers are accepted since some ids were created
/// from timestamps.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Epoch milliseconds or an RFC 3339 string, truncated to millisecond
/// precision so the result survives being written back.
pub(crate) fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::String(text) => match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(time) => time.timestamp_millis(),
            Err(_) => to_millis(number(value)?)?,
        },
        _ => to_millis(number(value)?)?,
    };
    DateTime::from_timestamp_millis(millis)
}

pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative integer count. Fractions are rounded, everything non-finite
/// or negative becomes zero.
pub(crate) fn count(value: &Value) -> Option<u32> {
    number(value).map(to_count)
}

pub(crate) fn load(value: &Value) -> Option<f64> {
    number(value).map(clamp_load)
}

#[allow(clippy::cast_possible_truncation)]
fn to_millis(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.floor() as i64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.round() as u32
    }
}
