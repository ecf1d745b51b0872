use chrono::Weekday;
use serde::Serialize;

use satchel_core::availability;
use satchel_core::block::Minute;
use satchel_core::ids::{CalendarId, TutorId};
use satchel_core::slots::{self, DurationChoice};
use satchel_core::week::WeekSchedule;
use satchel_ports::outbound::{BookedIntervalsProvider, SettingsProvider};

use crate::load;

/// One displayable week of a tutor's calendar.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekView {
    pub week_offset: i64,
    pub effective: WeekSchedule,
    #[serde(with = "satchel_core::week::weekday_indexes")]
    pub visible_days: Vec<Weekday>,
    pub start_hour: u8,
    pub end_hour: u8,
    pub degraded: bool,
}

/// Bookable start times for a displayed week.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    pub starts: Vec<Minute>,
    /// No day produced a start, so the bare calendar window is offered
    /// instead of filtered availability.
    pub window_fallback: bool,
    pub degraded: bool,
}

/// Duration dropdown state for a chosen start time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationOptions {
    pub choices: Vec<DurationChoice>,
    /// The carried-over selection, cleared when it no longer fits.
    pub selected: Option<Minute>,
}

pub struct AvailabilityService<S, B>
where
    S: SettingsProvider,
    B: BookedIntervalsProvider,
{
    settings: S,
    booked: B,
}

impl<S, B> AvailabilityService<S, B>
where
    S: SettingsProvider,
    B: BookedIntervalsProvider,
{
    pub fn new(settings: S, booked: B) -> Self {
        Self { settings, booked }
    }

    /// Effective availability for the week `week_offset` weeks out.
    pub async fn week_view(
        &self,
        tutor: &TutorId,
        calendar: &CalendarId,
        week_offset: i64,
    ) -> WeekView {
        let (policy, policy_degraded) = load::tutor_policy(&self.settings, tutor).await;
        let (booked_week, booked_degraded) =
            load::booked_for_week(&self.booked, calendar, week_offset).await;
        let buffered = booked_week.buffered(policy.buffer_minutes());
        let display = policy.calendar_display();
        WeekView {
            week_offset,
            effective: availability::resolve_week(&policy, &buffered),
            visible_days: display.visible_days().to_vec(),
            start_hour: display.start_hour(),
            end_hour: display.end_hour(),
            degraded: policy_degraded || booked_degraded,
        }
    }

    /// Start times bookable somewhere in the displayed week. Falls back
    /// to the unfiltered window when availability yields nothing at all.
    pub async fn start_options(
        &self,
        tutor: &TutorId,
        calendar: &CalendarId,
        week_offset: i64,
    ) -> StartOptions {
        let (policy, policy_degraded) = load::tutor_policy(&self.settings, tutor).await;
        let (booked_week, booked_degraded) =
            load::booked_for_week(&self.booked, calendar, week_offset).await;
        let buffered = booked_week.buffered(policy.buffer_minutes());
        let effective = availability::resolve_week(&policy, &buffered);
        let starts = slots::week_start_times(
            &effective,
            policy.calendar_display().visible_days(),
            policy.min_session_minutes(),
        );
        let window_fallback = starts.is_empty();
        let starts = if window_fallback {
            slots::window_start_times(policy.display_window(), policy.min_session_minutes())
        } else {
            starts
        };
        StartOptions {
            starts,
            window_fallback,
            degraded: policy_degraded || booked_degraded,
        }
    }

    /// Duration choices for a fixed day and start, carrying over the
    /// previous selection only while it still fits.
    pub async fn duration_options(
        &self,
        tutor: &TutorId,
        calendar: &CalendarId,
        week_offset: i64,
        day: Weekday,
        start: Minute,
        selected: Option<Minute>,
    ) -> DurationOptions {
        let (policy, _) = load::tutor_policy(&self.settings, tutor).await;
        let (booked_week, _) = load::booked_for_week(&self.booked, calendar, week_offset).await;
        let buffered = booked_week.buffered(policy.buffer_minutes());
        let effective = availability::resolve(&policy, &buffered, day);
        let choices = slots::valid_durations(&effective, start, policy.duration_ladder());
        let selected = slots::retain_selection(&choices, selected);
        DurationOptions { choices, selected }
    }
}
