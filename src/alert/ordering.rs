/// Reading order and freshness checks.
///
/// The gate assumes readings for a hazard arrive in non-decreasing
/// timestamp order; an older reading delivered late can clear suppression
/// spuriously. Weather snapshots also age: a stale snapshot should not keep
/// boosting flood and fire scores long after conditions changed.
///
/// # Clock injection
/// Every function takes `now` (or the previous timestamp) as a parameter
/// rather than calling `Utc::now()` internally, so tests stay deterministic.

use chrono::{DateTime, Utc};

use crate::model::WeatherSnapshot;

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Returns `true` if `next` is strictly older than the last accepted
/// reading. Equal timestamps are in order.
pub fn is_out_of_order(last_accepted: Option<DateTime<Utc>>, next: DateTime<Utc>) -> bool {
    last_accepted.is_some_and(|last| next < last)
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

/// Returns `true` if `observed_at` is older than `max_age_minutes`
/// relative to `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
///
/// Timestamps in the future are never stale.
pub fn is_stale_at(observed_at: DateTime<Utc>, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    let age_minutes = (now - observed_at).num_minutes();
    age_minutes > 0 && age_minutes as u64 > max_age_minutes
}

/// Drops a weather snapshot that is too old to score with.
///
/// A snapshot without a timestamp is kept: providers that omit it are
/// queried on demand, so the data is as fresh as the request.
pub fn fresh_weather(
    weather: Option<WeatherSnapshot>,
    max_age_minutes: u64,
    now: DateTime<Utc>,
) -> Option<WeatherSnapshot> {
    weather.filter(|w| match w.observed_at {
        Some(at) => !is_stale_at(at, max_age_minutes, now),
        None => true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
