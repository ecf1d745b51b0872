use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use satchel_core::block::Minute;
use satchel_core::booking::MeetingMode;
use satchel_core::ids::{CalendarId, TutorId};
use satchel_core::money::Money;
use satchel_core::week::WeekSchedule;

/// Booked intervals for one calendar week as they arrive from storage:
/// minute pairs keyed by weekday ("0".."6", Monday first), not yet
/// validated or normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWeekBlocks(pub BTreeMap<String, Vec<(i64, i64)>>);

impl RawWeekBlocks {
    pub fn into_week_schedule(self) -> WeekSchedule {
        WeekSchedule::from(self.0)
    }
}

/// A validated booking occurrence, ready for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub tutor: TutorId,
    pub calendar: CalendarId,
    pub date: NaiveDate,
    pub start_minute: Minute,
    pub duration_minutes: Minute,
    pub students: u8,
    pub meeting_mode: MeetingMode,
    pub add_on_ids: Vec<String>,
    pub include_summary: bool,
    pub discount_steps: u8,
    pub travel_surcharge: Money,
    pub final_cost: Money,
    pub final_cost_cents: i64,
    pub series_dates: Vec<NaiveDate>,
}
