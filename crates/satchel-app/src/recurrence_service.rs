use chrono::NaiveDate;
use serde::Serialize;

use satchel_core::error::DomainError;
use satchel_core::ids::CalendarId;
use satchel_core::policy::BookingPolicy;
use satchel_core::recurrence::{self, Occurrence, RecurrencePlan, SeriesStart};
use satchel_core::week::week_offset_between;
use satchel_ports::outbound::BookedIntervalsProvider;

use crate::error::AppError;
use crate::load;

/// Dates a weekly series may run until, stopping at the first week where
/// the slot is already taken.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndDateOptions {
    pub dates: Vec<NaiveDate>,
    pub degraded: bool,
}

/// Expands a weekly series and flags each occurrence against that
/// week's buffered bookings. Standing availability is not re-checked
/// here; the first occurrence was validated against it at selection.
pub(crate) async fn plan_series<B: BookedIntervalsProvider>(
    booked: &B,
    calendar: &CalendarId,
    today: NaiveDate,
    first: SeriesStart,
    last: NaiveDate,
    policy: &BookingPolicy,
) -> Result<RecurrencePlan, AppError> {
    if last < first.date() {
        return Err(DomainError::InvalidSeriesEnd.into());
    }
    let dates =
        recurrence::occurrence_dates(first.date(), last, policy.recurring_max_advance_weeks());
    let offsets: Vec<i64> = dates
        .iter()
        .map(|&date| week_offset_between(today, date))
        .collect();
    let fetch = load::booked_for_weeks(booked, calendar, &offsets).await;

    let day = first.weekday();
    let buffer = policy.buffer_minutes();
    let occurrences = dates
        .into_iter()
        .map(|date| {
            let offset = week_offset_between(today, date);
            let buffered = fetch.week(offset).buffered(buffer);
            Occurrence {
                date,
                blocked: recurrence::occurrence_blocked(&buffered, day, first.span()),
                degraded: fetch.is_failed(offset),
            }
        })
        .collect();
    Ok(RecurrencePlan {
        occurrences,
        degraded: fetch.degraded(),
    })
}

pub(crate) async fn end_options<B: BookedIntervalsProvider>(
    booked: &B,
    calendar: &CalendarId,
    today: NaiveDate,
    first: SeriesStart,
    policy: &BookingPolicy,
) -> EndDateOptions {
    let candidates: Vec<NaiveDate> =
        recurrence::candidate_end_dates(first.date(), policy.recurring_max_advance_weeks())
            .collect();
    let offsets: Vec<i64> = candidates
        .iter()
        .map(|&date| week_offset_between(today, date))
        .collect();
    let fetch = load::booked_for_weeks(booked, calendar, &offsets).await;

    let day = first.weekday();
    let buffer = policy.buffer_minutes();
    let mut dates = Vec::new();
    for date in candidates {
        let offset = week_offset_between(today, date);
        let buffered = fetch.week(offset).buffered(buffer);
        if recurrence::occurrence_blocked(&buffered, day, first.span()) {
            // Later weeks are unreachable once one is taken
            break;
        }
        dates.push(date);
    }
    EndDateOptions {
        dates,
        degraded: fetch.degraded(),
    }
}

pub struct RecurrenceService<B>
where
    B: BookedIntervalsProvider,
{
    booked: B,
}

impl<B> RecurrenceService<B>
where
    B: BookedIntervalsProvider,
{
    pub fn new(booked: B) -> Self {
        Self { booked }
    }

    /// The full occurrence list for a chosen first session and last date.
    pub async fn plan(
        &self,
        calendar: &CalendarId,
        today: NaiveDate,
        first: SeriesStart,
        last: NaiveDate,
        policy: &BookingPolicy,
    ) -> Result<RecurrencePlan, AppError> {
        plan_series(&self.booked, calendar, today, first, last, policy).await
    }

    /// The selectable series end dates for a chosen first session.
    pub async fn end_date_options(
        &self,
        calendar: &CalendarId,
        today: NaiveDate,
        first: SeriesStart,
        policy: &BookingPolicy,
    ) -> EndDateOptions {
        end_options(&self.booked, calendar, today, first, policy).await
    }
}
