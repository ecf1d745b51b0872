//! Validation of a concrete booking selection.
//!
//! These checks gate a submission; everything they reject surfaces as a
//! [`DomainError`] with a reason the caller can show to the guardian.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::{self, Minute, TimeBlock};
use crate::error::DomainError;
use crate::policy::{AddOn, BookingPolicy};
use crate::slots::SLOT_STEP;

/// How the session is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingMode {
    Online,
    Travel,
}

impl MeetingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingMode::Online => "online",
            MeetingMode::Travel => "travel",
        }
    }
}

impl fmt::Display for MeetingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingMode {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(MeetingMode::Online),
            "travel" | "in-person" => Ok(MeetingMode::Travel),
            other => Err(DomainError::UnknownMeetingMode(other.to_owned())),
        }
    }
}

pub fn validate_party_size(policy: &BookingPolicy, students: u8) -> Result<(), DomainError> {
    if students == 0 || students > policy.max_students_per_session() {
        return Err(DomainError::PartySize(students));
    }
    Ok(())
}

pub fn validate_mode(policy: &BookingPolicy, mode: MeetingMode) -> Result<(), DomainError> {
    if !policy.meeting_modes().allows(mode) {
        return Err(DomainError::ModeUnavailable);
    }
    Ok(())
}

/// Checks a start/duration pair against the offered ladder, the
/// quarter-hour grid, and the effective availability it must sit inside.
/// Returns the session span on success.
pub fn validate_selection(
    policy: &BookingPolicy,
    effective: &[TimeBlock],
    start: Minute,
    duration_minutes: Minute,
) -> Result<TimeBlock, DomainError> {
    if !policy.duration_ladder().any(|d| d == duration_minutes) {
        return Err(DomainError::UnsupportedDuration);
    }
    if start % SLOT_STEP != 0 {
        return Err(DomainError::MisalignedStart);
    }
    let span = TimeBlock::new(start, start.saturating_add(duration_minutes))?;
    if !block::covers(effective, span) {
        return Err(DomainError::OutsideAvailability);
    }
    Ok(span)
}

/// Maps selected add-on ids onto the policy's catalog.
pub fn resolve_add_ons(policy: &BookingPolicy, ids: &[String]) -> Result<Vec<AddOn>, DomainError> {
    ids.iter()
        .map(|id| {
            policy
                .find_add_on(id)
                .cloned()
                .ok_or_else(|| DomainError::UnknownAddOn(id.clone()))
        })
        .collect()
}

/// Rejects a span that collides with already-booked (buffered) time.
pub fn check_no_conflict(buffered: &[TimeBlock], span: TimeBlock) -> Result<(), DomainError> {
    if block::overlaps_any(buffered, span) {
        return Err(DomainError::BookingConflict);
    }
    Ok(())
}
