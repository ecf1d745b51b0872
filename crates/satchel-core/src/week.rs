use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::block::{self, Minute, TimeBlock};

pub const DAYS_PER_WEEK: usize = 7;

/// The days of the week in canonical order, Monday first.
pub const WEEK: [Weekday; DAYS_PER_WEEK] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Canonical weekday index, Monday = 0.
pub fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

pub fn weekday_from_index(idx: usize) -> Option<Weekday> {
    WEEK.get(idx).copied()
}

/// Parses a weekday from a numeric key ("0".."6", Monday first) or an
/// English day name of at least three letters ("sat", "Saturday").
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<u8>() {
        return weekday_from_index(n as usize);
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    const NAMES: [(&str, Weekday); 7] = [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ];
    NAMES
        .iter()
        .find(|(name, _)| name.starts_with(&lower))
        .map(|&(_, day)| day)
}

/// serde helper: `Vec<Weekday>` as Monday-first indexes.
pub mod weekday_indexes {
    use chrono::Weekday;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{weekday_from_index, weekday_index};

    pub fn serialize<S: Serializer>(days: &[Weekday], ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(days.iter().map(|d| weekday_index(*d) as u8))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Weekday>, D::Error> {
        let raw = Vec::<u8>::deserialize(de)?;
        raw.into_iter()
            .map(|i| {
                weekday_from_index(i as usize)
                    .ok_or_else(|| D::Error::custom("weekday index out of range"))
            })
            .collect()
    }
}

/// Per-weekday block lists, Monday first, always normalized. Used both for
/// configured availability and for one calendar week's booked intervals.
///
/// Serializes as a `{"0": [[start, end], ...], ..., "6": [...]}` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<(i64, i64)>>",
    into = "BTreeMap<String, Vec<(Minute, Minute)>>"
)]
pub struct WeekSchedule {
    days: [Vec<TimeBlock>; DAYS_PER_WEEK],
}

impl WeekSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, day: Weekday) -> &[TimeBlock] {
        &self.days[weekday_index(day)]
    }

    pub fn set_day(&mut self, day: Weekday, blocks: Vec<TimeBlock>) {
        self.days[weekday_index(day)] = block::normalize(blocks);
    }

    pub fn with_day(mut self, day: Weekday, blocks: Vec<TimeBlock>) -> Self {
        self.set_day(day, blocks);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[TimeBlock])> + '_ {
        WEEK.iter().map(move |&day| (day, self.day(day)))
    }

    /// Right-pads every day's booked blocks by `buffer` minutes.
    pub fn buffered(&self, buffer: Minute) -> WeekSchedule {
        WeekSchedule {
            days: self.days.clone().map(|blocks| block::apply_buffer(blocks, buffer)),
        }
    }
}

impl From<BTreeMap<String, Vec<(i64, i64)>>> for WeekSchedule {
    fn from(raw: BTreeMap<String, Vec<(i64, i64)>>) -> Self {
        let mut week = WeekSchedule::default();
        for (key, pairs) in raw {
            if let Some(day) = parse_weekday(&key) {
                let mut merged = week.day(day).to_vec();
                merged.extend(block::normalize_raw(&pairs));
                week.set_day(day, merged);
            }
        }
        week
    }
}

impl From<WeekSchedule> for BTreeMap<String, Vec<(Minute, Minute)>> {
    fn from(week: WeekSchedule) -> Self {
        week.days
            .into_iter()
            .enumerate()
            .map(|(i, blocks)| (i.to_string(), blocks.into_iter().map(Into::into).collect()))
            .collect()
    }
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Whole weeks between the Mondays of the two dates; negative when `target`
/// lies in an earlier week.
pub fn week_offset_between(today: NaiveDate, target: NaiveDate) -> i64 {
    (monday_of(target) - monday_of(today)).num_days() / 7
}

/// A Friday, Saturday, or Sunday "today" starts bookable views at next week;
/// the working week on display has already passed.
pub fn initial_week_offset(today: NaiveDate) -> i64 {
    if today.weekday().num_days_from_monday() >= 4 {
        1
    } else {
        0
    }
}
