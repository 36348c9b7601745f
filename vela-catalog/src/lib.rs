pub mod airports;
pub mod schedule;
pub mod listing;

pub use airports::{lookup_airport, Airport};
pub use schedule::{
    departure_instant, time_until_departure, validate_minimum_booking_time, validate_route,
    MIN_LEAD_TIME_HOURS,
};
pub use listing::{check_bookable, ListingDraft, ListingError};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("Unknown airport code: {0}")]
    UnknownAirport(String),

    #[error("Departure must be at least {lead_hours}h from now local time (earliest {earliest})")]
    DepartureTooSoon {
        earliest: chrono::NaiveDateTime,
        lead_hours: i64,
    },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
