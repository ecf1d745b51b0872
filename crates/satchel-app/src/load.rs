//! Loading paths shared by the services: policies and booked weeks, with
//! retry, bounded-batch fetching, and degraded fallbacks.
//!
//! Booked data is advisory. A week that cannot be fetched is treated as
//! open rather than blocked, because missing data is not proof of a
//! conflict; callers get a `degraded` flag and decide what to surface.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use futures::future::join_all;
use tokio::time::{sleep, Duration};
use tracing::warn;

use satchel_core::ids::{CalendarId, TutorId};
use satchel_core::policy::BookingPolicy;
use satchel_core::week::WeekSchedule;
use satchel_ports::error::PortError;
use satchel_ports::outbound::{BookedIntervalsProvider, SettingsProvider};

const FETCH_RETRIES: u32 = 2;
const BACKOFF_STEP: Duration = Duration::from_secs(2);

/// How many week fetches may be in flight at once.
const FETCH_BATCH: usize = 10;

/// Runs `op` up to three times, waiting 2s then 4s between attempts.
pub(crate) async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, PortError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < FETCH_RETRIES => {
                attempt += 1;
                warn!(attempt, error = %err, "fetch failed, retrying");
                sleep(BACKOFF_STEP * attempt).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// The site-wide policy, or hard defaults when settings are unreachable.
/// The flag reports whether defaults had to stand in.
pub async fn site_policy<S: SettingsProvider>(settings: &S) -> (BookingPolicy, bool) {
    match with_retry(|| settings.site_settings()).await {
        Ok(raw) => (
            BookingPolicy::from_value(&raw, &BookingPolicy::default()),
            false,
        ),
        Err(err) => {
            warn!(error = %err, "site settings unavailable, using defaults");
            (BookingPolicy::default(), true)
        }
    }
}

/// The effective policy for one tutor: site policy with the tutor's
/// overrides normalized on top.
pub async fn tutor_policy<S: SettingsProvider>(
    settings: &S,
    tutor: &TutorId,
) -> (BookingPolicy, bool) {
    let (site, degraded) = site_policy(settings).await;
    match with_retry(|| settings.tutor_overrides(tutor)).await {
        Ok(Some(raw)) => (BookingPolicy::tutor_from_value(&raw, &site), degraded),
        Ok(None) => (site, degraded),
        Err(err) => {
            warn!(error = %err, %tutor, "tutor overrides unavailable, using site policy");
            (site, true)
        }
    }
}

/// Result of fetching booked intervals for a set of week offsets.
#[derive(Debug, Default)]
pub struct WeekFetch {
    weeks: BTreeMap<i64, WeekSchedule>,
    failed: BTreeSet<i64>,
}

impl WeekFetch {
    /// Booked intervals for `offset`; an unfetched or failed week reads
    /// as empty.
    pub fn week(&self, offset: i64) -> WeekSchedule {
        self.weeks.get(&offset).cloned().unwrap_or_default()
    }

    /// Whether this particular week's data never arrived.
    pub fn is_failed(&self, offset: i64) -> bool {
        self.failed.contains(&offset)
    }

    pub fn degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Fetches booked intervals for every distinct offset, at most
/// [`FETCH_BATCH`] requests in flight at a time.
pub async fn booked_for_weeks<B: BookedIntervalsProvider>(
    booked: &B,
    calendar: &CalendarId,
    offsets: &[i64],
) -> WeekFetch {
    let mut distinct: Vec<i64> = offsets.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let mut fetch = WeekFetch::default();
    for batch in distinct.chunks(FETCH_BATCH) {
        let in_flight = batch.iter().map(|&offset| async move {
            (
                offset,
                with_retry(|| booked.booked_for_week(calendar, offset)).await,
            )
        });
        for (offset, result) in join_all(in_flight).await {
            match result {
                Ok(raw) => {
                    fetch.weeks.insert(offset, raw.into_week_schedule());
                }
                Err(err) => {
                    warn!(offset, error = %err, "booked intervals unavailable, treating week as open");
                    fetch.failed.insert(offset);
                }
            }
        }
    }
    fetch
}

/// Single-week convenience over [`booked_for_weeks`].
pub async fn booked_for_week<B: BookedIntervalsProvider>(
    booked: &B,
    calendar: &CalendarId,
    offset: i64,
) -> (WeekSchedule, bool) {
    let fetch = booked_for_weeks(booked, calendar, &[offset]).await;
    (fetch.week(offset), fetch.degraded())
}
