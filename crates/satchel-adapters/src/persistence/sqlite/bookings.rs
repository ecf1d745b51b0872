use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};

use satchel_core::ids::{BookingId, CalendarId};
use satchel_core::week::{monday_of, weekday_index};
use satchel_ports::error::PortError;
use satchel_ports::outbound::{BookedIntervalsProvider, BookingSink};
use satchel_ports::types::{BookingRequest, RawWeekBlocks};

use super::SqliteDb;

#[async_trait]
impl BookingSink for SqliteDb {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingId, PortError> {
        let id = BookingId::new();
        let data =
            serde_json::to_string(request).map_err(|e| PortError::Persistence(e.to_string()))?;
        let start = i64::from(request.start_minute);
        let end = start + i64::from(request.duration_minutes);

        sqlx::query(
            "INSERT INTO bookings (id, calendar_id, tutor_id, date, start_minute, end_minute, data)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(request.calendar.to_string())
        .bind(request.tutor.to_string())
        .bind(request.date.to_string())
        .bind(start)
        .bind(end)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(id)
    }
}

#[async_trait]
impl BookedIntervalsProvider for SqliteDb {
    /// Week offsets count from the week containing today, so the same
    /// offset a browser asks for maps to the same Monday here.
    async fn booked_for_week(
        &self,
        calendar: &CalendarId,
        week_offset: i64,
    ) -> Result<RawWeekBlocks, PortError> {
        let monday = monday_of(Utc::now().date_naive()) + Duration::days(7 * week_offset);
        let sunday = monday + Duration::days(6);

        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT date, start_minute, end_minute FROM bookings
             WHERE calendar_id = ? AND date BETWEEN ? AND ?
             ORDER BY date, start_minute",
        )
        .bind(calendar.to_string())
        .bind(monday.to_string())
        .bind(sunday.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        let mut days: BTreeMap<String, Vec<(i64, i64)>> = BTreeMap::new();
        for (date, start, end) in rows {
            let date: NaiveDate = date
                .parse()
                .map_err(|e: chrono::ParseError| PortError::Persistence(e.to_string()))?;
            days.entry(weekday_index(date.weekday()).to_string())
                .or_default()
                .push((start, end));
        }
        Ok(RawWeekBlocks(days))
    }
}
