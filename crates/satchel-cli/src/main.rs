use async_trait::async_trait;
use chrono::{Duration, Utc, Weekday};
use serde_json::json;
use tracing::info;

use satchel_adapters::geocode::{NominatimGeocoder, TableGeocoder};
use satchel_adapters::persistence::sqlite::SqliteDb;
use satchel_app::availability_service::AvailabilityService;
use satchel_app::booking_service::{BookingService, BookingSubmission};
use satchel_app::load;
use satchel_app::recurrence_service::RecurrenceService;
use satchel_core::booking::MeetingMode;
use satchel_core::geo::Coordinate;
use satchel_core::ids::{CalendarId, TutorId};
use satchel_core::money::Money;
use satchel_core::recurrence::SeriesStart;
use satchel_core::week::{initial_week_offset, monday_of};
use satchel_ports::error::{GeocodeError, PortError};
use satchel_ports::outbound::{BookingSink, Geocoder};
use satchel_ports::types::BookingRequest;

/// Runtime-selected geocoder backend.
enum AnyGeocoder {
    Table(TableGeocoder),
    Nominatim(NominatimGeocoder),
}

#[async_trait]
impl Geocoder for AnyGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        match self {
            Self::Table(g) => g.geocode(address).await,
            Self::Nominatim(g) => g.geocode(address).await,
        }
    }
}

/// Addresses the offline demo can resolve, placed around the seeded
/// tutor base in Montreal.
fn demo_geocoder() -> TableGeocoder {
    TableGeocoder::new()
        .with("12 Main St", Coordinate::new(45.5647, -73.5673).unwrap())
        .with("3 Riverside Ave", Coordinate::new(45.5200, -73.5800).unwrap())
        .with("99 Far Road", Coordinate::new(45.7000, -73.3000).unwrap())
}

async fn seed(db: &SqliteDb, tutor: &TutorId) -> Result<(), PortError> {
    db.put_site_settings(&json!({
        "maxStudentsPerSession": 4,
        "maxHoursPerSession": 2,
        "minSessionMinutes": 60,
        "bufferMinutes": 15,
        "baseSessionCost": 50,
        "extraStudentCost": 20,
        "sessionSummaryCost": 10,
        "recurringMaxAdvanceWeeks": 12,
        "availability": {
            "mon": [[540, 1020]],
            "tue": [[540, 1020]],
            "wed": [[540, 720]],
            "thu": [[540, 1020]],
            "fri": [[540, 960]]
        },
        "calendarDisplay": {
            "startHour": 8,
            "endHour": 20,
            "visibleDays": ["mon", "tue", "wed", "thu", "fri"]
        },
        "addOns": [
            {"id": "materials", "label": "Printed materials", "priceDelta": 7.5}
        ],
        "travelRadiusKm": 15,
        "travelZoneBreaksKm": [5, 10, 15],
        "travelRadiusPricing": [
            {"upToKm": 5, "priceDelta": 5},
            {"upToKm": 10, "priceDelta": 10},
            {"upToKm": 15, "priceDelta": 18}
        ],
        "location": {"lat": 45.5017, "lng": -73.5673},
        "currency": "CAD"
    }))
    .await?;

    // Tutor narrows Monday and Tuesday, inherits the other days
    db.put_tutor_overrides(
        tutor,
        &json!({
            "availability": {"mon": [[600, 1020]], "tue": [[540, 900]]},
            "baseSessionCost": 55
        }),
    )
    .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let db_url = std::env::var("SATCHEL_DB").unwrap_or_else(|_| "sqlite::memory:".into());
    let address = std::env::var("SATCHEL_ADDRESS").unwrap_or_else(|_| "12 Main St".into());
    let geocoder = match std::env::var("SATCHEL_GEOCODER").as_deref() {
        Ok("nominatim") => {
            let endpoint = std::env::var("SATCHEL_NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".into());
            AnyGeocoder::Nominatim(NominatimGeocoder::with_endpoint(&endpoint)?)
        }
        _ => AnyGeocoder::Table(demo_geocoder()),
    };

    let db = SqliteDb::new(&db_url).await?;
    let tutor = TutorId::new();
    let calendar = CalendarId::new();
    seed(&db, &tutor).await?;
    info!(%tutor, %calendar, db = %db_url, "seeded demo marketplace");

    let availability = AvailabilityService::new(db.clone(), db.clone());
    let recurrence = RecurrenceService::new(db.clone());
    let bookings = BookingService::new(db.clone(), db.clone(), geocoder, db.clone());

    let today = Utc::now().date_naive();
    let date = monday_of(today) + Duration::days(7);

    let (policy, _) = load::tutor_policy(&db, &tutor).await;
    println!(
        "tutor policy:\n{}",
        serde_json::to_string_pretty(&policy)?
    );

    // Late in the week the calendar opens on next week
    let opening = availability
        .week_view(&tutor, &calendar, initial_week_offset(today))
        .await;
    println!("opening week view:\n{}", serde_json::to_string_pretty(&opening)?);

    let view = availability.week_view(&tutor, &calendar, 1).await;
    println!("next week:\n{}", serde_json::to_string_pretty(&view)?);

    let starts = availability.start_options(&tutor, &calendar, 1).await;
    let Some(&start) = starts.starts.first() else {
        println!("tutor has no bookable starts next week");
        return Ok(());
    };
    let durations = availability
        .duration_options(&tutor, &calendar, 1, Weekday::Mon, start, None)
        .await;
    let Some(duration) = durations.choices.iter().find(|c| c.valid).map(|c| c.minutes) else {
        println!("no workable duration at minute {start}");
        return Ok(());
    };
    info!(start, duration, %date, "picked the first open Monday slot");

    // A rival booking two weeks into the series, to show skipping
    let clash_date = date + Duration::days(14);
    db.create_booking(&BookingRequest {
        tutor: tutor.clone(),
        calendar: calendar.clone(),
        date: clash_date,
        start_minute: start,
        duration_minutes: duration,
        students: 1,
        meeting_mode: MeetingMode::Online,
        add_on_ids: Vec::new(),
        include_summary: false,
        discount_steps: 0,
        travel_surcharge: Money::ZERO,
        final_cost: Money::from_cents(5500),
        final_cost_cents: 5500,
        series_dates: vec![clash_date],
    })
    .await?;
    info!(%clash_date, "seeded a conflicting booking");

    // The UI would stop offering end dates at the clash
    let first = SeriesStart::new(date, start, duration)?;
    let ends = recurrence
        .end_date_options(&calendar, today, first, &policy)
        .await;
    println!(
        "offered series end dates:\n{}",
        serde_json::to_string_pretty(&ends)?
    );

    // Booking past the clash anyway: the engine books around it
    let outcome = bookings
        .place(BookingSubmission {
            tutor: tutor.clone(),
            calendar: calendar.clone(),
            today,
            date,
            start_minute: start,
            duration_minutes: duration,
            students: 2,
            meeting_mode: MeetingMode::Travel,
            address: Some(address),
            add_on_ids: vec!["materials".to_owned()],
            include_summary: true,
            discount_steps: 1,
            recur_until: Some(date + Duration::days(28)),
        })
        .await?;
    println!(
        "placement outcome:\n{}",
        serde_json::to_string_pretty(&outcome)?
    );

    let after = availability.week_view(&tutor, &calendar, 1).await;
    println!(
        "next week after booking:\n{}",
        serde_json::to_string_pretty(&after)?
    );

    Ok(())
}
