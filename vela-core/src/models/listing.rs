use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled charter flight published by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightListing {
    pub id: Uuid,
    pub operator_id: Uuid,
    pub from: String,
    pub to: String,
    /// LTC at the departure airport.
    pub departure: NaiveDateTime,
    pub aircraft: String,
    pub seat_capacity: u32,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
