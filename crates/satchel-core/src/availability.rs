//! Effective bookable time per weekday.
//!
//! Configured availability is a standing weekly offer; what a guardian can
//! actually book on a given week is that offer clipped to the calendar
//! window with that week's buffered bookings subtracted.

use chrono::Weekday;

use crate::block::{self, TimeBlock};
use crate::policy::BookingPolicy;
use crate::week::{WeekSchedule, WEEK};

/// Combines a tutor's own configured week with the site-wide one.
///
/// Days configured on both sides intersect, so a tutor cannot offer hours
/// the site forbids. Days configured on only one side pass through as-is.
pub fn merge_configured(own: &WeekSchedule, site: &WeekSchedule) -> WeekSchedule {
    let mut merged = WeekSchedule::new();
    for day in WEEK {
        let own_blocks = own.day(day);
        let site_blocks = site.day(day);
        let blocks = if own_blocks.is_empty() {
            site_blocks.to_vec()
        } else if site_blocks.is_empty() {
            own_blocks.to_vec()
        } else {
            block::intersect(own_blocks, site_blocks)
        };
        merged.set_day(day, blocks);
    }
    merged
}

/// Effective bookable intervals for one weekday of one concrete week:
/// configured availability, clipped to the display window, minus that
/// week's buffered bookings.
pub fn resolve(
    policy: &BookingPolicy,
    buffered_booked: &WeekSchedule,
    day: Weekday,
) -> Vec<TimeBlock> {
    let windowed = block::intersect(policy.availability_for(day), &[policy.display_window()]);
    block::subtract(&windowed, buffered_booked.day(day))
}

/// [`resolve`] across the whole week.
pub fn resolve_week(policy: &BookingPolicy, buffered_booked: &WeekSchedule) -> WeekSchedule {
    let mut week = WeekSchedule::new();
    for day in WEEK {
        week.set_day(day, resolve(policy, buffered_booked, day));
    }
    week
}
