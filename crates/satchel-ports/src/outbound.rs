use async_trait::async_trait;
use serde_json::Value;

use satchel_core::geo::Coordinate;
use satchel_core::ids::{BookingId, CalendarId, TutorId};

use crate::error::{GeocodeError, PortError};
use crate::types::{BookingRequest, RawWeekBlocks};

#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn site_settings(&self) -> Result<Value, PortError>;
    async fn tutor_overrides(&self, tutor: &TutorId) -> Result<Option<Value>, PortError>;
}

#[async_trait]
pub trait BookedIntervalsProvider: Send + Sync {
    /// Booked intervals for the week `week_offset` whole weeks after the
    /// current one. Idempotent; safe to call repeatedly for the same week.
    async fn booked_for_week(
        &self,
        calendar: &CalendarId,
        week_offset: i64,
    ) -> Result<RawWeekBlocks, PortError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves free-text into a coordinate; `None` means the address
    /// exists but could not be located.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingId, PortError>;
}
