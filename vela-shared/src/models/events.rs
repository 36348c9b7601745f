use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventKind {
    Created,
    Submitted,
    Approved,
    Rejected,
    Paid,
    Cancelled,
    Expired,
}

/// Broadcast to operator/admin dashboards whenever a booking changes state.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub operator_id: Uuid,
    pub kind: BookingEventKind,
    pub timestamp: i64,
}
