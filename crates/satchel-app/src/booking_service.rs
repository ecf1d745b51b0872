use chrono::NaiveDate;
use serde::Serialize;

use satchel_core::availability;
use satchel_core::block::Minute;
use satchel_core::booking::{self, MeetingMode};
use satchel_core::error::DomainError;
use satchel_core::ids::{BookingId, CalendarId, TutorId};
use satchel_core::money::Money;
use satchel_core::policy::BookingPolicy;
use satchel_core::pricing::{self, CostBreakdown, CostInputs};
use satchel_core::recurrence::SeriesStart;
use satchel_core::slots;
use satchel_core::week::{week_offset_between, WeekSchedule};
use satchel_ports::outbound::{BookedIntervalsProvider, BookingSink, Geocoder, SettingsProvider};
use satchel_ports::types::BookingRequest;

use crate::error::AppError;
use crate::load;
use crate::recurrence_service::plan_series;

/// Shown when parts of a series were skipped over collisions.
const SKIPPED_DATES_WARNING: &str =
    "Your session will not be booked on those dates, but it will still be booked for the other sessions.";

/// Shown when a port kept failing and the booking went through on
/// fallback data.
const DEGRADED_DATA_WARNING: &str =
    "Some calendar data could not be loaded, so availability may be incomplete.";

/// Everything the guardian chose, plus the caller's view of "today".
#[derive(Debug, Clone)]
pub struct BookingSubmission {
    pub tutor: TutorId,
    pub calendar: CalendarId,
    pub today: NaiveDate,
    pub date: NaiveDate,
    pub start_minute: Minute,
    pub duration_minutes: Minute,
    pub students: u8,
    pub meeting_mode: MeetingMode,
    pub address: Option<String>,
    pub add_on_ids: Vec<String>,
    pub include_summary: bool,
    pub discount_steps: u8,
    pub recur_until: Option<NaiveDate>,
}

/// What came out of a submission: the created bookings, the series dates
/// that had to be skipped, and the priced breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub booking_ids: Vec<BookingId>,
    pub booked_dates: Vec<NaiveDate>,
    pub skipped_dates: Vec<NaiveDate>,
    pub warning: Option<String>,
    pub cost: CostBreakdown,
    pub degraded: bool,
}

pub struct BookingService<S, B, G, K>
where
    S: SettingsProvider,
    B: BookedIntervalsProvider,
    G: Geocoder,
    K: BookingSink,
{
    settings: S,
    booked: B,
    geocoder: G,
    sink: K,
}

impl<S, B, G, K> BookingService<S, B, G, K>
where
    S: SettingsProvider,
    B: BookedIntervalsProvider,
    G: Geocoder,
    K: BookingSink,
{
    pub fn new(settings: S, booked: B, geocoder: G, sink: K) -> Self {
        Self {
            settings,
            booked,
            geocoder,
            sink,
        }
    }

    /// Validates and persists one submission, expanding a recurring
    /// series when a last date was chosen. Occurrences that collide are
    /// skipped with a warning; only a series with nothing left is an
    /// error.
    pub async fn place(&self, submission: BookingSubmission) -> Result<BookingOutcome, AppError> {
        let BookingSubmission {
            tutor,
            calendar,
            today,
            date,
            start_minute,
            duration_minutes,
            students,
            meeting_mode,
            address,
            add_on_ids,
            include_summary,
            discount_steps,
            recur_until,
        } = submission;

        let (policy, mut degraded) = load::tutor_policy(&self.settings, &tutor).await;

        booking::validate_party_size(&policy, students)?;
        booking::validate_mode(&policy, meeting_mode)?;
        let add_ons = booking::resolve_add_ons(&policy, &add_on_ids)?;
        let first = SeriesStart::new(date, start_minute, duration_minutes)?;
        let day = first.weekday();

        // Selection against the standing offer. A week that offers no
        // start anywhere falls back to the bare display window, same as
        // the calendar shows in that case.
        let offer = availability::resolve_week(&policy, &WeekSchedule::new());
        let offerable = slots::week_start_times(
            &offer,
            policy.calendar_display().visible_days(),
            policy.min_session_minutes(),
        );
        let span = if offerable.is_empty() {
            booking::validate_selection(
                &policy,
                &[policy.display_window()],
                start_minute,
                duration_minutes,
            )?
        } else {
            booking::validate_selection(&policy, offer.day(day), start_minute, duration_minutes)?
        };

        // The chosen date itself must be free
        let offset = week_offset_between(today, date);
        let (booked_week, booked_degraded) =
            load::booked_for_week(&self.booked, &calendar, offset).await;
        degraded |= booked_degraded;
        booking::check_no_conflict(
            booked_week.buffered(policy.buffer_minutes()).day(day),
            span,
        )?;

        let travel_surcharge = match meeting_mode {
            MeetingMode::Travel => {
                quote_travel(&self.geocoder, &policy, address.as_deref()).await?
            }
            MeetingMode::Online => Money::ZERO,
        };

        // Expand the series; a single booking is a series of one
        let last = recur_until.unwrap_or(date);
        let plan = plan_series(&self.booked, &calendar, today, first, last, &policy).await?;
        degraded |= plan.degraded;
        if plan.is_fully_blocked() {
            return Err(DomainError::EmptySeries.into());
        }

        let cost = pricing::quote(
            &policy,
            &CostInputs {
                students,
                duration_minutes,
                include_summary,
                add_ons: &add_ons,
                travel_surcharge,
                discount_steps,
            },
        );

        let booked_dates = plan.open_dates();
        let skipped_dates = plan.blocked_dates();
        let applied_steps = discount_steps.min(pricing::max_discount_steps(students));
        let mut booking_ids = Vec::with_capacity(booked_dates.len());
        for &occurrence in &booked_dates {
            let request = BookingRequest {
                tutor: tutor.clone(),
                calendar: calendar.clone(),
                date: occurrence,
                start_minute,
                duration_minutes,
                students,
                meeting_mode,
                add_on_ids: add_on_ids.clone(),
                include_summary,
                discount_steps: applied_steps,
                travel_surcharge,
                final_cost: cost.total(),
                final_cost_cents: cost.total_cents(),
                series_dates: booked_dates.clone(),
            };
            booking_ids.push(self.sink.create_booking(&request).await?);
        }

        let warning = if !skipped_dates.is_empty() {
            Some(SKIPPED_DATES_WARNING.to_owned())
        } else if degraded {
            Some(DEGRADED_DATA_WARNING.to_owned())
        } else {
            None
        };
        Ok(BookingOutcome {
            booking_ids,
            booked_dates,
            skipped_dates,
            warning,
            cost,
            degraded,
        })
    }
}

/// Distance-priced surcharge for a travel session. Fails closed: no
/// resolvable coordinate on either side means no booking, never a
/// silent zero charge.
async fn quote_travel<G: Geocoder>(
    geocoder: &G,
    policy: &BookingPolicy,
    address: Option<&str>,
) -> Result<Money, AppError> {
    let Some(address) = address else {
        return Err(DomainError::NoLocation.into());
    };
    let Some(base) = policy.travel().base_location() else {
        return Err(DomainError::NoLocation.into());
    };
    let student = geocoder
        .geocode(address)
        .await?
        .ok_or(DomainError::NoLocation)?;
    Ok(policy.travel().price_for(base.distance_km(student))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use satchel_core::geo::Coordinate;
    use satchel_ports::error::{GeocodeError, PortError};
    use satchel_ports::types::RawWeekBlocks;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // --- Mock adapters ---

    struct StaticSettings {
        site: Value,
    }

    #[async_trait]
    impl SettingsProvider for StaticSettings {
        async fn site_settings(&self) -> Result<Value, PortError> {
            Ok(self.site.clone())
        }
        async fn tutor_overrides(&self, _tutor: &TutorId) -> Result<Option<Value>, PortError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct StaticBooked {
        weeks: BTreeMap<i64, RawWeekBlocks>,
    }

    #[async_trait]
    impl BookedIntervalsProvider for StaticBooked {
        async fn booked_for_week(
            &self,
            _calendar: &CalendarId,
            week_offset: i64,
        ) -> Result<RawWeekBlocks, PortError> {
            Ok(self.weeks.get(&week_offset).cloned().unwrap_or_default())
        }
    }

    struct BrokenSettings;

    #[async_trait]
    impl SettingsProvider for BrokenSettings {
        async fn site_settings(&self) -> Result<Value, PortError> {
            Err(PortError::Unavailable("settings store down".into()))
        }
        async fn tutor_overrides(&self, _tutor: &TutorId) -> Result<Option<Value>, PortError> {
            Err(PortError::Unavailable("settings store down".into()))
        }
    }

    /// Open on the first call, fully booked afterwards. Simulates a
    /// booking that lands between the conflict check and the series
    /// expansion.
    #[derive(Default)]
    struct RacingBooked {
        calls: AtomicU32,
    }

    #[async_trait]
    impl BookedIntervalsProvider for RacingBooked {
        async fn booked_for_week(
            &self,
            _calendar: &CalendarId,
            _week_offset: i64,
        ) -> Result<RawWeekBlocks, PortError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(RawWeekBlocks::default());
            }
            Ok(RawWeekBlocks(BTreeMap::from([(
                "0".to_owned(),
                vec![(600, 660)],
            )])))
        }
    }

    struct FixedGeocoder {
        result: Option<Coordinate>,
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, GeocodeError> {
            Ok(self.result)
        }
    }

    struct DownGeocoder;

    #[async_trait]
    impl Geocoder for DownGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, GeocodeError> {
            Err(GeocodeError::Unavailable("quota exhausted".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        requests: Mutex<Vec<BookingRequest>>,
    }

    #[async_trait]
    impl BookingSink for RecordingSink {
        async fn create_booking(&self, request: &BookingRequest) -> Result<BookingId, PortError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(BookingId::new())
        }
    }

    // --- Fixtures ---

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monday_site() -> Value {
        json!({
            "bufferMinutes": 15,
            "availability": {"mon": [[540, 960]]}
        })
    }

    fn travel_site() -> Value {
        json!({
            "bufferMinutes": 15,
            "availability": {"mon": [[540, 960]]},
            "travelRadiusKm": 10,
            "travelZoneBreaksKm": [5, 10],
            "travelRadiusPricing": [
                {"upToKm": 5, "priceDelta": 5},
                {"upToKm": 10, "priceDelta": 10}
            ],
            "location": {"lat": 45.5017, "lng": -73.5673}
        })
    }

    /// Monday 2026-08-24 at 10:00 for an hour, one student, online.
    fn submission() -> BookingSubmission {
        BookingSubmission {
            tutor: TutorId::new(),
            calendar: CalendarId::new(),
            today: date(2026, 8, 24),
            date: date(2026, 8, 24),
            start_minute: 600,
            duration_minutes: 60,
            students: 1,
            meeting_mode: MeetingMode::Online,
            address: None,
            add_on_ids: Vec::new(),
            include_summary: false,
            discount_steps: 0,
            recur_until: None,
        }
    }

    fn service(
        site: Value,
        weeks: BTreeMap<i64, RawWeekBlocks>,
        geocoder: FixedGeocoder,
    ) -> BookingService<StaticSettings, StaticBooked, FixedGeocoder, RecordingSink> {
        BookingService::new(
            StaticSettings { site },
            StaticBooked { weeks },
            geocoder,
            RecordingSink::default(),
        )
    }

    fn no_geocoder() -> FixedGeocoder {
        FixedGeocoder { result: None }
    }

    #[tokio::test]
    async fn single_booking_persists_one_request() {
        let svc = service(monday_site(), BTreeMap::new(), no_geocoder());

        let outcome = svc.place(submission()).await.unwrap();

        assert_eq!(outcome.booking_ids.len(), 1);
        assert_eq!(outcome.booked_dates, vec![date(2026, 8, 24)]);
        assert!(outcome.skipped_dates.is_empty());
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.cost.total(), Money::from_cents(5000));
        assert!(!outcome.degraded);

        let requests = svc.sink.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].start_minute, 600);
        assert_eq!(requests[0].final_cost_cents, 5000);
        assert_eq!(requests[0].series_dates, vec![date(2026, 8, 24)]);
    }

    #[tokio::test]
    async fn recurring_series_skips_collisions() {
        // Week 2 of the series already has Monday 10:00 taken
        let weeks = BTreeMap::from([(
            2,
            RawWeekBlocks(BTreeMap::from([("0".to_owned(), vec![(600, 660)])])),
        )]);
        let svc = service(monday_site(), weeks, no_geocoder());

        let outcome = svc
            .place(BookingSubmission {
                recur_until: Some(date(2026, 9, 14)),
                ..submission()
            })
            .await
            .unwrap();

        assert_eq!(outcome.booking_ids.len(), 3);
        assert_eq!(
            outcome.booked_dates,
            vec![date(2026, 8, 24), date(2026, 8, 31), date(2026, 9, 14)]
        );
        assert_eq!(outcome.skipped_dates, vec![date(2026, 9, 7)]);
        assert_eq!(outcome.warning.as_deref(), Some(SKIPPED_DATES_WARNING));

        // Every persisted request carries the kept dates, not the skipped one
        let requests = svc.sink.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.series_dates == outcome.booked_dates));
    }

    #[tokio::test]
    async fn conflicting_first_date_rejected_up_front() {
        let weeks = BTreeMap::from([(
            0,
            RawWeekBlocks(BTreeMap::from([("0".to_owned(), vec![(600, 660)])])),
        )]);
        let svc = service(monday_site(), weeks, no_geocoder());

        let err = svc.place(submission()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::BookingConflict)
        ));
        assert!(svc.sink.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn buffer_blocks_back_to_back_start() {
        // 9:00-10:00 booked with a 15-minute buffer: 10:00 is too soon
        let weeks = BTreeMap::from([(
            0,
            RawWeekBlocks(BTreeMap::from([("0".to_owned(), vec![(540, 600)])])),
        )]);
        let svc = service(monday_site(), weeks, no_geocoder());

        let err = svc.place(submission()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::BookingConflict)
        ));
    }

    #[tokio::test]
    async fn series_fully_taken_mid_flight_is_rejected() {
        let svc = BookingService::new(
            StaticSettings { site: monday_site() },
            RacingBooked::default(),
            no_geocoder(),
            RecordingSink::default(),
        );

        let err = svc
            .place(BookingSubmission {
                recur_until: Some(date(2026, 8, 31)),
                ..submission()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::EmptySeries)));
        assert!(svc.sink.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn travel_surcharge_reaches_cost_and_request() {
        // Student roughly 7 km north of the base location
        let svc = service(
            travel_site(),
            BTreeMap::new(),
            FixedGeocoder {
                result: Some(Coordinate::new(45.5647, -73.5673).unwrap()),
            },
        );

        let outcome = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                address: Some("123 Anywhere St".to_owned()),
                ..submission()
            })
            .await
            .unwrap();

        assert_eq!(outcome.cost.travel(), Money::from_cents(1000));
        // $50 base plus the $10 zone surcharge
        assert_eq!(outcome.cost.total(), Money::from_cents(6000));
        let requests = svc.sink.requests.lock().unwrap();
        assert_eq!(requests[0].travel_surcharge, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn travel_outside_radius_rejected() {
        // Roughly 13 km away against a 10 km radius
        let svc = service(
            travel_site(),
            BTreeMap::new(),
            FixedGeocoder {
                result: Some(Coordinate::new(45.6217, -73.5673).unwrap()),
            },
        );

        let err = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                address: Some("far away".to_owned()),
                ..submission()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::OutsideTravelRadius)
        ));
    }

    #[tokio::test]
    async fn unresolvable_address_fails_closed() {
        let svc = service(travel_site(), BTreeMap::new(), no_geocoder());
        let err = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                address: Some("nowhere".to_owned()),
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NoLocation)));

        // A missing address is the same rejection
        let err = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NoLocation)));
    }

    #[tokio::test]
    async fn geocoder_outage_is_not_a_silent_zero() {
        let svc = BookingService::new(
            StaticSettings { site: travel_site() },
            StaticBooked::default(),
            DownGeocoder,
            RecordingSink::default(),
        );

        let err = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                address: Some("123 Anywhere St".to_owned()),
                ..submission()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Geocode(_)));
        assert!(svc.sink.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_travel_mode_rejected() {
        let site = json!({
            "availability": {"mon": [[540, 960]]},
            "meetingModes": {"travel": false}
        });
        let svc = service(site, BTreeMap::new(), no_geocoder());

        let err = svc
            .place(BookingSubmission {
                meeting_mode: MeetingMode::Travel,
                address: Some("123 Anywhere St".to_owned()),
                ..submission()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::ModeUnavailable)
        ));
    }

    #[tokio::test]
    async fn add_ons_and_summary_priced_in() {
        let site = json!({
            "availability": {"mon": [[540, 960]]},
            "addOns": [{"id": "materials", "priceDelta": 7.5}]
        });
        let svc = service(site, BTreeMap::new(), no_geocoder());

        let outcome = svc
            .place(BookingSubmission {
                add_on_ids: vec!["materials".to_owned()],
                include_summary: true,
                ..submission()
            })
            .await
            .unwrap();

        // 50 + 7.50 + 10
        assert_eq!(outcome.cost.total(), Money::from_cents(6750));
    }

    #[tokio::test]
    async fn unknown_add_on_rejected() {
        let svc = service(monday_site(), BTreeMap::new(), no_geocoder());
        let err = svc
            .place(BookingSubmission {
                add_on_ids: vec!["lab-rental".to_owned()],
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::UnknownAddOn(id)) if id == "lab-rental"
        ));
    }

    #[tokio::test]
    async fn selection_outside_offer_rejected() {
        let svc = service(monday_site(), BTreeMap::new(), no_geocoder());
        // 16:30 is past the configured 9:00-16:00 Monday offer
        let err = svc
            .place(BookingSubmission {
                start_minute: 990,
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::OutsideAvailability)
        ));
    }

    #[tokio::test]
    async fn empty_offer_falls_back_to_window() {
        // Nothing configured anywhere: the calendar window is the offer
        let site = json!({"availability": {}, "bufferMinutes": 0});
        let svc = service(site, BTreeMap::new(), no_geocoder());

        let outcome = svc.place(submission()).await.unwrap();
        assert_eq!(outcome.booking_ids.len(), 1);
    }

    #[tokio::test]
    async fn oversized_party_rejected() {
        let svc = service(monday_site(), BTreeMap::new(), no_geocoder());
        let err = svc
            .place(BookingSubmission {
                students: 5,
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::PartySize(5))));
    }

    #[tokio::test]
    async fn group_discount_clamped_and_applied() {
        let svc = service(monday_site(), BTreeMap::new(), no_geocoder());
        let outcome = svc
            .place(BookingSubmission {
                students: 2,
                discount_steps: 5,
                ..submission()
            })
            .await
            .unwrap();

        // (50 + 20) for one hour minus a single $10 step
        assert_eq!(outcome.cost.discount(), Money::from_cents(1000));
        assert_eq!(outcome.cost.total(), Money::from_cents(6000));
        // The persisted request records what was applied, not what was asked
        let requests = svc.sink.requests.lock().unwrap();
        assert_eq!(requests[0].discount_steps, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_settings_book_on_defaults_with_warning() {
        // Defaults offer Sunday only while showing Mon-Fri, so the
        // window fallback accepts the Monday slot
        let svc = BookingService::new(
            BrokenSettings,
            StaticBooked::default(),
            no_geocoder(),
            RecordingSink::default(),
        );

        let outcome = svc.place(submission()).await.unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.warning.as_deref(), Some(DEGRADED_DATA_WARNING));
        assert_eq!(outcome.booking_ids.len(), 1);
        assert_eq!(outcome.cost.total(), Money::from_cents(5000));
    }

    #[tokio::test]
    async fn future_week_offset_checked_not_current() {
        // Booked next week; booking for next Monday must collide
        let weeks = BTreeMap::from([(
            1,
            RawWeekBlocks(BTreeMap::from([("0".to_owned(), vec![(600, 660)])])),
        )]);
        let svc = service(monday_site(), weeks, no_geocoder());

        let err = svc
            .place(BookingSubmission {
                today: date(2026, 8, 19),
                date: date(2026, 8, 24),
                ..submission()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::BookingConflict)
        ));
    }
}
