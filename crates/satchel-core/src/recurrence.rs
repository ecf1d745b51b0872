//! Weekly recurrence expansion and per-occurrence conflict checks.
//!
//! The calendar-week fetches that feed [`occurrence_blocked`] are the
//! caller's job; everything here is pure date and interval math.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::block::{self, Minute, TimeBlock};
use crate::error::DomainError;
use crate::week::WeekSchedule;

/// The chosen first occurrence of a series: a concrete date plus a
/// validated within-day span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStart {
    date: NaiveDate,
    span: TimeBlock,
}

impl SeriesStart {
    pub fn new(date: NaiveDate, start: Minute, duration_minutes: Minute) -> Result<Self, DomainError> {
        let span = TimeBlock::new(start, start.saturating_add(duration_minutes))?;
        Ok(SeriesStart { date, span })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn span(&self) -> TimeBlock {
        self.span
    }

    pub fn start_minute(&self) -> Minute {
        self.span.start()
    }

    pub fn duration_minutes(&self) -> Minute {
        self.span.minutes()
    }

    /// Weekday shared by every occurrence, since they sit 7 days apart.
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// The first occurrence plus every 7-day step that is on or before
/// `last`, capped at `max_weeks` occurrences in total.
pub fn occurrence_dates(first: NaiveDate, last: NaiveDate, max_weeks: u8) -> Vec<NaiveDate> {
    let cap = usize::from(max_weeks.max(1));
    let mut dates = vec![first];
    let mut next = first + Duration::days(7);
    while next <= last && dates.len() < cap {
        dates.push(next);
        next += Duration::days(7);
    }
    dates
}

/// The dates a series could end on: one per whole week after the first
/// occurrence, up to the advance-booking horizon.
pub fn candidate_end_dates(first: NaiveDate, max_weeks: u8) -> impl Iterator<Item = NaiveDate> {
    (1..=i64::from(max_weeks.max(1))).map(move |weeks| first + Duration::days(7 * weeks))
}

/// Whether a session span collides with that week's buffered bookings.
pub fn occurrence_blocked(buffered: &WeekSchedule, day: Weekday, span: TimeBlock) -> bool {
    block::overlaps_any(buffered.day(day), span)
}

/// One expanded entry of a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub date: NaiveDate,
    /// Collides with an existing booking; skipped at persistence time.
    pub blocked: bool,
    /// Booked data for this week never arrived; treated as open.
    pub degraded: bool,
}

/// The expanded series with per-occurrence conflict flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePlan {
    pub occurrences: Vec<Occurrence>,
    pub degraded: bool,
}

impl RecurrencePlan {
    pub fn open_dates(&self) -> Vec<NaiveDate> {
        self.occurrences
            .iter()
            .filter(|o| !o.blocked)
            .map(|o| o.date)
            .collect()
    }

    pub fn blocked_dates(&self) -> Vec<NaiveDate> {
        self.occurrences
            .iter()
            .filter(|o| o.blocked)
            .map(|o| o.date)
            .collect()
    }

    /// Every single occurrence collides; the series cannot be booked.
    pub fn is_fully_blocked(&self) -> bool {
        !self.occurrences.is_empty() && self.occurrences.iter().all(|o| o.blocked)
    }
}
