//! Coercion helpers for policy documents.
//!
//! Stored settings come from form submissions and older schema versions,
//! so every field is treated as untrusted: numbers may arrive as strings,
//! times as "HH:MM" or raw minutes, and lists in several shapes. Helpers
//! return `None` for anything unusable and callers fall back to defaults.

use serde_json::Value;

use crate::block::{self, Minute, TimeBlock};
use crate::money::Money;
use crate::week::{parse_weekday, weekday_from_index, weekday_index, WeekSchedule, DAYS_PER_WEEK};

pub(crate) fn number_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub(crate) fn number_field(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(number_value)
}

pub(crate) fn bool_field(raw: &Value, key: &str) -> Option<bool> {
    raw.get(key).and_then(Value::as_bool)
}

pub(crate) fn string_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Rounds to the nearest whole number, then clamps into `[min, max]`.
pub(crate) fn clamp_u8(raw: Option<f64>, fallback: u8, min: u8, max: u8) -> u8 {
    let value = raw.unwrap_or(f64::from(fallback)).round();
    value.clamp(f64::from(min), f64::from(max)) as u8
}

/// Rounds to the nearest multiple of `step`, then clamps into `[min, max]`.
pub(crate) fn clamp_step_u16(
    raw: Option<f64>,
    fallback: u16,
    min: u16,
    max: u16,
    step: u16,
) -> u16 {
    let value = raw.unwrap_or(f64::from(fallback));
    let stepped = (value / f64::from(step)).round() * f64::from(step);
    stepped.clamp(f64::from(min), f64::from(max)) as u16
}

/// A non-negative money amount, or the fallback when missing or unusable.
pub(crate) fn money_field(raw: &Value, key: &str, fallback: Money) -> Money {
    number_field(raw, key)
        .map(|v| Money::from_major(v.max(0.0)))
        .unwrap_or(fallback)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses "HH:MM" into minutes since midnight. "24:00" marks end of day.
pub(crate) fn clock_minutes(raw: &str) -> Option<Minute> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    let hours: u16 = hours.trim().parse().ok()?;
    let minutes: u16 = minutes.trim().parse().ok()?;
    if minutes > 59 {
        return None;
    }
    let total = hours * 60 + minutes;
    (total <= block::DAY_END).then_some(total)
}

/// A minute-of-day from either a number or a clock string.
fn minute_value(raw: &Value) -> Option<i64> {
    match raw {
        Value::String(s) => clock_minutes(s)
            .map(i64::from)
            .or_else(|| number_value(raw).map(|v| v.round() as i64)),
        _ => number_value(raw).map(|v| v.round() as i64),
    }
}

/// One availability block from either a `[start, end]` pair or a
/// `{start, end}` object. Out-of-range endpoints are clamped into the day.
fn block_entry(raw: &Value) -> Option<TimeBlock> {
    let (start, end) = match raw {
        Value::Array(pair) if pair.len() == 2 => {
            (minute_value(&pair[0])?, minute_value(&pair[1])?)
        }
        Value::Object(map) => {
            let start = map.get("start").or_else(|| map.get("from"))?;
            let end = map.get("end").or_else(|| map.get("to"))?;
            (minute_value(start)?, minute_value(end)?)
        }
        _ => return None,
    };
    TimeBlock::from_raw(start, end)
}

/// A normalized block list from a JSON array, dropping unusable entries.
pub(crate) fn blocks_from_value(raw: &Value) -> Vec<TimeBlock> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };
    block::normalize(entries.iter().filter_map(block_entry).collect())
}

/// A weekly schedule from an object keyed by day name or Monday-based
/// index. Lists under keys naming the same day are merged.
pub(crate) fn week_from_value(raw: &Value) -> Option<WeekSchedule> {
    let map = raw.as_object()?;
    let mut days: [Vec<TimeBlock>; DAYS_PER_WEEK] = Default::default();
    for (key, value) in map {
        let Some(day) = parse_weekday(key) else {
            continue;
        };
        days[weekday_index(day)].extend(blocks_from_value(value));
    }
    let mut schedule = WeekSchedule::new();
    for (idx, blocks) in days.into_iter().enumerate() {
        if let Some(day) = weekday_from_index(idx) {
            schedule.set_day(day, blocks);
        }
    }
    Some(schedule)
}
