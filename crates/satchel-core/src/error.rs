use thiserror::Error;

/// Reasons a selection or booking is rejected. Configuration problems never
/// surface here; the settings normalizer is total and clamps instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid id for {0}")]
    InvalidId(String),
    #[error("time block must end after it starts")]
    InvalidTimeBlock,
    #[error("coordinate out of range")]
    InvalidCoordinate,
    #[error("party size {0} is not accepted for this tutor")]
    PartySize(u8),
    #[error("session length is not offered")]
    UnsupportedDuration,
    #[error("start time must fall on a 15-minute mark")]
    MisalignedStart,
    #[error("selection falls outside the tutor's availability")]
    OutsideAvailability,
    #[error("selection overlaps an existing booking")]
    BookingConflict,
    #[error("meeting mode is not offered by this tutor")]
    ModeUnavailable,
    #[error("unknown meeting mode {0}")]
    UnknownMeetingMode(String),
    #[error("unknown add-on {0}")]
    UnknownAddOn(String),
    #[error("student location could not be resolved")]
    NoLocation,
    #[error("student location is outside the travel radius")]
    OutsideTravelRadius,
    #[error("last date must fall after the first session")]
    InvalidSeriesEnd,
    #[error("every date in the series is already booked")]
    EmptySeries,
}
