use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    /// Seats on an operator-published flight listing.
    Flight,
    /// A custom route request priced by the operator on approval.
    Route,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    PendingOperatorApproval,
    Confirmed,
    Cancelled,
    Expired,
    RejectedByOperator,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Expired | BookingStatus::RejectedByOperator
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::PendingOperatorApproval => "Pending Operator Approval",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Expired => "Expired",
            BookingStatus::RejectedByOperator => "Rejected by Operator",
        };
        f.write_str(s)
    }
}

/// Route and schedule. Times are LTC: local to the departure airport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDetails {
    pub from: String,
    pub to: String,
    pub departure: NaiveDateTime,
    pub return_departure: Option<NaiveDateTime>,
}

impl RouteDetails {
    pub fn same_route(&self, other: &RouteDetails) -> bool {
        self.from.eq_ignore_ascii_case(&other.from)
            && self.to.eq_ignore_ascii_case(&other.to)
            && self.departure == other.departure
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscountDetails {
    pub requested: bool,
    pub applied: bool,
    pub percentage: u32,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationDetails {
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
    /// True when the booking was unpaid and consumed a cancellation right.
    pub free_cancellation: bool,
    pub penalty_percentage: u32,
    pub penalty_cents: i64,
    pub refund_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub operator_id: Uuid,
    pub kind: BookingKind,
    pub listing_id: Option<Uuid>,
    pub route: RouteDetails,
    pub passenger_count: u32,
    pub trip_type: TripType,
    pub status: BookingStatus,
    pub notes: Option<String>,
    /// Known at creation for flight bookings, quoted by the operator for routes.
    pub base_price_cents: Option<i64>,
    pub final_price_cents: Option<i64>,
    pub discount: DiscountDetails,
    pub approval_deadline: Option<DateTime<Utc>>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub cancellation: Option<CancellationDetails>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: Uuid,
        operator_id: Uuid,
        kind: BookingKind,
        listing_id: Option<Uuid>,
        route: RouteDetails,
        passenger_count: u32,
        trip_type: TripType,
        base_price_cents: Option<i64>,
        discount_requested: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            operator_id,
            kind,
            listing_id,
            route,
            passenger_count,
            trip_type,
            status: BookingStatus::Pending,
            notes: None,
            base_price_cents,
            final_price_cents: base_price_cents,
            discount: DiscountDetails {
                requested: discount_requested,
                ..DiscountDetails::default()
            },
            approval_deadline: None,
            payment_deadline: None,
            is_paid: false,
            paid_at: None,
            transaction_id: None,
            cancellation: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// Active bookings count towards the one-booking-per-route rule.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && !self.status.is_terminal()
    }

    pub fn awaiting_payment(&self) -> bool {
        self.status == BookingStatus::Confirmed && !self.is_paid
    }

    pub fn amount_due_cents(&self) -> i64 {
        self.final_price_cents.or(self.base_price_cents).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn route() -> RouteDetails {
        RouteDetails {
            from: "TEB".into(),
            to: "VNY".into(),
            departure: NaiveDate::from_ymd_opt(2030, 6, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            return_departure: None,
        }
    }

    #[test]
    fn test_status_display_matches_dashboard_labels() {
        assert_eq!(BookingStatus::PendingOperatorApproval.to_string(), "Pending Operator Approval");
        assert_eq!(BookingStatus::RejectedByOperator.to_string(), "Rejected by Operator");
    }

    #[test]
    fn test_new_booking_defaults() {
        let booking = BookingRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BookingKind::Flight,
            Some(Uuid::new_v4()),
            route(),
            4,
            TripType::OneWay,
            Some(2_500_000),
            true,
        );
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.is_active());
        assert!(booking.discount.requested);
        assert!(!booking.discount.applied);
        assert_eq!(booking.amount_due_cents(), 2_500_000);
    }

    #[test]
    fn test_same_route_ignores_case() {
        let mut other = route();
        other.from = "teb".into();
        assert!(route().same_route(&other));
        other.departure = other.departure + chrono::Duration::hours(1);
        assert!(!route().same_route(&other));
    }
}
