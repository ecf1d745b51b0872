//! Canonical booking configuration.
//!
//! Raw settings documents (site-wide or per-tutor) are normalized into an
//! immutable [`BookingPolicy`]. Normalization is total: malformed or
//! missing fields clamp to the fallback policy, never to an error.

mod addon;
mod display;
mod normalize;
mod travel;

pub use addon::AddOn;
pub use display::CalendarDisplay;
pub use travel::{PriceTier, TravelPolicy};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::availability::merge_configured;
use crate::block::{self, TimeBlock};
use crate::booking::MeetingMode;
use crate::money::Money;
use crate::week::WeekSchedule;

use normalize::{bool_field, clamp_step_u16, clamp_u8, money_field, number_field, string_field};

/// Which ways a tutor is willing to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingModes {
    pub online: bool,
    pub travel: bool,
}

impl MeetingModes {
    pub fn allows(&self, mode: MeetingMode) -> bool {
        match mode {
            MeetingMode::Online => self.online,
            MeetingMode::Travel => self.travel,
        }
    }

    fn from_value(raw: Option<&Value>, defaults: MeetingModes) -> MeetingModes {
        let Some(raw) = raw else {
            return defaults;
        };
        MeetingModes {
            online: bool_field(raw, "online").unwrap_or(defaults.online),
            travel: bool_field(raw, "travel").unwrap_or(defaults.travel),
        }
    }
}

impl Default for MeetingModes {
    fn default() -> Self {
        MeetingModes {
            online: true,
            travel: true,
        }
    }
}

/// The full normalized booking configuration for one tutor (or the site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPolicy {
    max_students_per_session: u8,
    max_hours_per_session: u8,
    min_session_minutes: u16,
    buffer_minutes: u16,
    base_session_cost: Money,
    extra_student_cost: Money,
    session_summary_cost: Money,
    recurring_max_advance_weeks: u8,
    availability: WeekSchedule,
    calendar_display: CalendarDisplay,
    meeting_modes: MeetingModes,
    travel: TravelPolicy,
    add_ons: Vec<AddOn>,
    currency: String,
}

impl BookingPolicy {
    /// Normalizes a raw settings document against `defaults`.
    pub fn from_value(raw: &Value, defaults: &BookingPolicy) -> BookingPolicy {
        let max_hours_per_session = clamp_u8(
            number_field(raw, "maxHoursPerSession"),
            defaults.max_hours_per_session,
            1,
            6,
        );
        let min_session_minutes = clamp_step_u16(
            number_field(raw, "minSessionMinutes"),
            defaults.min_session_minutes,
            30,
            u16::from(max_hours_per_session) * 60,
            15,
        );
        BookingPolicy {
            max_students_per_session: clamp_u8(
                number_field(raw, "maxStudentsPerSession"),
                defaults.max_students_per_session,
                1,
                8,
            ),
            max_hours_per_session,
            min_session_minutes,
            buffer_minutes: clamp_step_u16(
                number_field(raw, "bufferMinutes"),
                defaults.buffer_minutes,
                0,
                240,
                5,
            ),
            base_session_cost: money_field(raw, "baseSessionCost", defaults.base_session_cost),
            extra_student_cost: money_field(raw, "extraStudentCost", defaults.extra_student_cost),
            session_summary_cost: money_field(
                raw,
                "sessionSummaryCost",
                defaults.session_summary_cost,
            ),
            recurring_max_advance_weeks: clamp_u8(
                number_field(raw, "recurringMaxAdvanceWeeks"),
                defaults.recurring_max_advance_weeks,
                1,
                52,
            ),
            availability: raw
                .get("availability")
                .and_then(normalize::week_from_value)
                .unwrap_or_else(|| defaults.availability.clone()),
            calendar_display: CalendarDisplay::from_value(
                raw.get("calendarDisplay"),
                &defaults.calendar_display,
            ),
            meeting_modes: MeetingModes::from_value(
                raw.get("meetingModes"),
                defaults.meeting_modes,
            ),
            travel: TravelPolicy::from_value(raw, &defaults.travel),
            add_ons: addon::add_ons_from_value(raw.get("addOns"), &defaults.add_ons),
            currency: string_field(raw, "currency")
                .map(str::to_ascii_uppercase)
                .unwrap_or_else(|| defaults.currency.clone()),
        }
    }

    /// Normalizes tutor overrides on top of the site policy.
    ///
    /// Fields fall back to the site value, except availability: a tutor
    /// who configures their own hours gets the per-day intersection with
    /// the site schedule, since overrides cannot widen the site's offer.
    pub fn tutor_from_value(raw: &Value, site: &BookingPolicy) -> BookingPolicy {
        let mut policy = BookingPolicy::from_value(raw, site);
        if let Some(own) = raw.get("availability").and_then(normalize::week_from_value) {
            policy.availability = merge_configured(&own, &site.availability);
        }
        policy
    }

    pub fn max_students_per_session(&self) -> u8 {
        self.max_students_per_session
    }

    pub fn max_hours_per_session(&self) -> u8 {
        self.max_hours_per_session
    }

    pub fn min_session_minutes(&self) -> u16 {
        self.min_session_minutes
    }

    pub fn max_session_minutes(&self) -> u16 {
        u16::from(self.max_hours_per_session) * 60
    }

    pub fn buffer_minutes(&self) -> u16 {
        self.buffer_minutes
    }

    pub fn base_session_cost(&self) -> Money {
        self.base_session_cost
    }

    pub fn extra_student_cost(&self) -> Money {
        self.extra_student_cost
    }

    pub fn session_summary_cost(&self) -> Money {
        self.session_summary_cost
    }

    pub fn recurring_max_advance_weeks(&self) -> u8 {
        self.recurring_max_advance_weeks
    }

    pub fn availability(&self) -> &WeekSchedule {
        &self.availability
    }

    pub fn availability_for(&self, day: Weekday) -> &[TimeBlock] {
        self.availability.day(day)
    }

    pub fn calendar_display(&self) -> &CalendarDisplay {
        &self.calendar_display
    }

    pub fn display_window(&self) -> TimeBlock {
        self.calendar_display.window()
    }

    pub fn meeting_modes(&self) -> MeetingModes {
        self.meeting_modes
    }

    pub fn travel(&self) -> &TravelPolicy {
        &self.travel
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    pub fn find_add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|add_on| add_on.id() == id)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Offered session lengths in minutes, stepped by quarter hour.
    pub fn duration_ladder(&self) -> impl Iterator<Item = u16> {
        (self.min_session_minutes..=self.max_session_minutes()).step_by(15)
    }
}

impl Default for BookingPolicy {
    /// The hard-coded site fallback used when no stored settings exist.
    fn default() -> Self {
        BookingPolicy {
            max_students_per_session: 4,
            max_hours_per_session: 2,
            min_session_minutes: 60,
            buffer_minutes: 15,
            base_session_cost: Money::from_cents(5000),
            extra_student_cost: Money::from_cents(2000),
            session_summary_cost: Money::from_cents(1000),
            recurring_max_advance_weeks: 12,
            availability: WeekSchedule::new()
                .with_day(Weekday::Sun, block::normalize_raw(&[(660, 960)])),
            calendar_display: CalendarDisplay::default(),
            meeting_modes: MeetingModes::default(),
            travel: TravelPolicy::default(),
            add_ons: Vec::new(),
            currency: "CAD".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site(raw: Value) -> BookingPolicy {
        BookingPolicy::from_value(&raw, &BookingPolicy::default())
    }

    #[test]
    fn defaults_when_document_empty() {
        let policy = site(json!({}));
        assert_eq!(policy, BookingPolicy::default());
        assert_eq!(policy.max_students_per_session(), 4);
        assert_eq!(policy.display_window(), TimeBlock::new(480, 1200).unwrap());
        assert_eq!(policy.availability_for(Weekday::Sun).len(), 1);
    }

    #[test]
    fn min_session_capped_by_max_hours() {
        let policy = site(json!({"maxHoursPerSession": 2, "minSessionMinutes": 10}));
        assert_eq!(policy.min_session_minutes(), 30);

        let policy = site(json!({"maxHoursPerSession": 2, "minSessionMinutes": 200}));
        assert_eq!(policy.min_session_minutes(), 120);
    }

    #[test]
    fn numeric_strings_coerced() {
        let policy = site(json!({
            "maxStudentsPerSession": "6",
            "bufferMinutes": "22",
            "baseSessionCost": "64.5"
        }));
        assert_eq!(policy.max_students_per_session(), 6);
        // 22 rounds to the nearest 5-minute step
        assert_eq!(policy.buffer_minutes(), 20);
        assert_eq!(policy.base_session_cost(), Money::from_cents(6450));
    }

    #[test]
    fn out_of_range_counts_clamped() {
        let policy = site(json!({
            "maxStudentsPerSession": 40,
            "maxHoursPerSession": 0,
            "recurringMaxAdvanceWeeks": 100,
            "bufferMinutes": 999
        }));
        assert_eq!(policy.max_students_per_session(), 8);
        assert_eq!(policy.max_hours_per_session(), 1);
        assert_eq!(policy.recurring_max_advance_weeks(), 52);
        assert_eq!(policy.buffer_minutes(), 240);
    }

    #[test]
    fn duration_ladder_spans_min_to_max() {
        let policy = site(json!({"minSessionMinutes": 60, "maxHoursPerSession": 2}));
        let ladder: Vec<u16> = policy.duration_ladder().collect();
        assert_eq!(ladder, vec![60, 75, 90, 105, 120]);
    }

    #[test]
    fn tutor_availability_intersects_site() {
        let site_policy = site(json!({
            "availability": {"sun": [[660, 960]], "mon": [[540, 720]]}
        }));
        let tutor = BookingPolicy::tutor_from_value(
            &json!({"availability": {"sun": [[600, 780]], "tue": [[840, 900]]}}),
            &site_policy,
        );
        // Overlap of the two Sunday offers
        let sun = tutor.availability_for(Weekday::Sun);
        assert_eq!((sun[0].start(), sun[0].end()), (660, 780));
        // Site-only and tutor-only days both survive
        assert_eq!(tutor.availability_for(Weekday::Mon).len(), 1);
        assert_eq!(tutor.availability_for(Weekday::Tue).len(), 1);
    }

    #[test]
    fn tutor_without_availability_inherits_site() {
        let site_policy = site(json!({"availability": {"wed": [[540, 720]]}}));
        let tutor = BookingPolicy::tutor_from_value(&json!({"bufferMinutes": 30}), &site_policy);
        assert_eq!(tutor.availability(), site_policy.availability());
        assert_eq!(tutor.buffer_minutes(), 30);
    }

    #[test]
    fn meeting_modes_only_disable_explicitly() {
        let policy = site(json!({"meetingModes": {"travel": false}}));
        assert!(policy.meeting_modes().allows(MeetingMode::Online));
        assert!(!policy.meeting_modes().allows(MeetingMode::Travel));
    }

    #[test]
    fn currency_uppercased() {
        let policy = site(json!({"currency": "usd"}));
        assert_eq!(policy.currency(), "USD");
    }

    #[test]
    fn policy_round_trips_through_json() {
        let policy = site(json!({
            "maxStudentsPerSession": 3,
            "availability": {"fri": [[540, 660]]},
            "addOns": [{"id": "materials", "priceDelta": 7.5}]
        }));
        let encoded = serde_json::to_value(&policy).unwrap();
        let decoded: BookingPolicy = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, policy);
    }
}
