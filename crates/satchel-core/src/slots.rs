//! Start-time and duration enumeration over effective availability.

use chrono::Weekday;
use serde::Serialize;

use crate::block::{Minute, TimeBlock};
use crate::week::WeekSchedule;

/// Sessions start on quarter-hour marks.
pub const SLOT_STEP: Minute = 15;

fn align_up(minute: Minute) -> Minute {
    minute.div_ceil(SLOT_STEP) * SLOT_STEP
}

/// All aligned start times within `effective` that leave room for at
/// least `min_duration` minutes. Ascending, no duplicates.
pub fn valid_start_times(effective: &[TimeBlock], min_duration: Minute) -> Vec<Minute> {
    let mut starts = Vec::new();
    for block in effective {
        let mut t = align_up(block.start());
        while t + min_duration <= block.end() {
            starts.push(t);
            t += SLOT_STEP;
        }
    }
    starts
}

/// Union of [`valid_start_times`] across the visible days of a week.
pub fn week_start_times(
    effective: &WeekSchedule,
    visible: &[Weekday],
    min_duration: Minute,
) -> Vec<Minute> {
    let mut starts: Vec<Minute> = visible
        .iter()
        .flat_map(|&day| valid_start_times(effective.day(day), min_duration))
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Aligned start times over the bare display window, ignoring
/// availability. Degraded fallback for when no day yields a start.
pub fn window_start_times(window: TimeBlock, min_duration: Minute) -> Vec<Minute> {
    valid_start_times(&[window], min_duration)
}

/// One entry of the duration dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationChoice {
    pub minutes: Minute,
    pub valid: bool,
}

/// Flags each offered duration by whether a session of that length
/// starting at `start` still fits inside one effective interval.
pub fn valid_durations(
    effective: &[TimeBlock],
    start: Minute,
    ladder: impl Iterator<Item = Minute>,
) -> Vec<DurationChoice> {
    ladder
        .map(|minutes| {
            let valid = effective
                .iter()
                .any(|b| b.start() <= start && b.end() >= start + minutes);
            DurationChoice { minutes, valid }
        })
        .collect()
}

/// Carries a previously selected duration across a start-time change,
/// dropping it when it is no longer offered or no longer fits.
pub fn retain_selection(choices: &[DurationChoice], selected: Option<Minute>) -> Option<Minute> {
    let selected = selected?;
    choices
        .iter()
        .find(|c| c.minutes == selected && c.valid)
        .map(|c| c.minutes)
}
