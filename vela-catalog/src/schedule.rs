//! LTC (Local Time Coordination) rules.
//!
//! Departure times are entered and stored in the departure airport's local
//! time. Conversions use the fixed offsets from [`crate::airports`], so a
//! departure is only comparable to "now" after being shifted by that offset.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use vela_core::{RouteDetails, TripType};

use crate::airports::lookup_airport;
use crate::{CatalogError, CatalogResult};

pub const MIN_LEAD_TIME_HOURS: i64 = 3;

fn airport_offset_minutes(code: &str) -> CatalogResult<i64> {
    lookup_airport(code)
        .map(|a| a.utc_offset_minutes as i64)
        .ok_or_else(|| CatalogError::UnknownAirport(code.to_string()))
}

/// Current wall-clock time at the given airport.
pub fn local_now(code: &str, now: DateTime<Utc>) -> CatalogResult<NaiveDateTime> {
    let offset = airport_offset_minutes(code)?;
    Ok(now.naive_utc() + Duration::minutes(offset))
}

/// The UTC instant of a local departure time at the given airport.
pub fn departure_instant(code: &str, local: NaiveDateTime) -> CatalogResult<DateTime<Utc>> {
    let offset = airport_offset_minutes(code)?;
    Ok((local - Duration::minutes(offset)).and_utc())
}

pub fn time_until_departure(
    code: &str,
    local: NaiveDateTime,
    now: DateTime<Utc>,
) -> CatalogResult<Duration> {
    Ok(departure_instant(code, local)? - now)
}

/// Departure must be at least `lead_hours` after the current local time at
/// the departure airport.
pub fn validate_minimum_booking_time(
    code: &str,
    departure_local: NaiveDateTime,
    now: DateTime<Utc>,
    lead_hours: i64,
) -> CatalogResult<()> {
    let earliest = local_now(code, now)? + Duration::hours(lead_hours);
    if departure_local < earliest {
        return Err(CatalogError::DepartureTooSoon {
            earliest,
            lead_hours,
        });
    }
    Ok(())
}

/// Full route check used by booking creation.
pub fn validate_route(
    route: &RouteDetails,
    trip_type: TripType,
    now: DateTime<Utc>,
    lead_hours: i64,
) -> CatalogResult<()> {
    lookup_airport(&route.from).ok_or_else(|| CatalogError::UnknownAirport(route.from.clone()))?;
    lookup_airport(&route.to).ok_or_else(|| CatalogError::UnknownAirport(route.to.clone()))?;

    if route.from.eq_ignore_ascii_case(&route.to) {
        return Err(CatalogError::InvalidSchedule(
            "origin and destination must differ".to_string(),
        ));
    }

    validate_minimum_booking_time(&route.from, route.departure, now, lead_hours)?;

    match (trip_type, route.return_departure) {
        (TripType::OneWay, Some(_)) => Err(CatalogError::InvalidSchedule(
            "one-way trips cannot carry a return departure".to_string(),
        )),
        (TripType::RoundTrip, None) => Err(CatalogError::InvalidSchedule(
            "round trips require a return departure".to_string(),
        )),
        (TripType::RoundTrip, Some(return_local)) => {
            // The return leg departs from the destination, in its local time.
            let outbound = departure_instant(&route.from, route.departure)?;
            let inbound = departure_instant(&route.to, return_local)?;
            if inbound <= outbound {
                return Err(CatalogError::InvalidSchedule(
                    "return must depart after the outbound flight".to_string(),
                ));
            }
            Ok(())
        }
        (TripType::OneWay, None) => Ok(()),
    }
}
