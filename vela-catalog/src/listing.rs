use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use vela_core::FlightListing;
use vela_shared::money::MAX_AMOUNT_CENTS;

use crate::schedule::validate_minimum_booking_time;
use crate::airports::lookup_airport;
use crate::CatalogError;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ListingError {
    #[error(transparent)]
    Schedule(#[from] CatalogError),

    #[error("Listing is no longer available: {0}")]
    Inactive(Uuid),

    #[error("Requested {requested} passengers but aircraft seats {capacity}")]
    CapacityExceeded { requested: u32, capacity: u32 },

    #[error("Invalid listing: {0}")]
    Invalid(String),
}

/// Operator input for publishing a flight.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingDraft {
    pub from: String,
    pub to: String,
    pub departure: NaiveDateTime,
    pub aircraft: String,
    pub seat_capacity: u32,
    pub price_cents: i64,
}

impl ListingDraft {
    pub fn into_listing(
        self,
        operator_id: Uuid,
        now: DateTime<Utc>,
        lead_hours: i64,
    ) -> Result<FlightListing, ListingError> {
        let from = lookup_airport(&self.from)
            .ok_or_else(|| CatalogError::UnknownAirport(self.from.clone()))?;
        let to = lookup_airport(&self.to)
            .ok_or_else(|| CatalogError::UnknownAirport(self.to.clone()))?;

        if from.code == to.code {
            return Err(ListingError::Invalid("origin and destination must differ".into()));
        }
        if self.aircraft.trim().is_empty() {
            return Err(ListingError::Invalid("aircraft is required".into()));
        }
        if self.seat_capacity == 0 {
            return Err(ListingError::Invalid("seat capacity must be positive".into()));
        }
        if self.price_cents <= 0 {
            return Err(ListingError::Invalid("price must be positive".into()));
        }
        if self.price_cents > MAX_AMOUNT_CENTS {
            return Err(ListingError::Invalid(format!(
                "price exceeds the {} cent limit",
                MAX_AMOUNT_CENTS
            )));
        }

        validate_minimum_booking_time(from.code, self.departure, now, lead_hours)?;

        Ok(FlightListing {
            id: Uuid::new_v4(),
            operator_id,
            from: from.code.to_string(),
            to: to.code.to_string(),
            departure: self.departure,
            aircraft: self.aircraft.trim().to_string(),
            seat_capacity: self.seat_capacity,
            price_cents: self.price_cents,
            is_active: true,
            created_at: now,
        })
    }
}

/// Checks a listing can still take a booking for `passengers`.
pub fn check_bookable(
    listing: &FlightListing,
    passengers: u32,
    now: DateTime<Utc>,
    lead_hours: i64,
) -> Result<(), ListingError> {
    if !listing.is_active {
        return Err(ListingError::Inactive(listing.id));
    }
    if passengers == 0 || passengers > listing.seat_capacity {
        return Err(ListingError::CapacityExceeded {
            requested: passengers,
            capacity: listing.seat_capacity,
        });
    }
    validate_minimum_booking_time(&listing.from, listing.departure, now, lead_hours)?;
    Ok(())
}
