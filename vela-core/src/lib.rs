pub mod models;
pub mod repository;
pub mod payment;

pub use models::{
    BookingKind, BookingRequest, BookingStatus, FlightListing, Invoice, InvoiceDirection,
    InvoiceStatus, InvoiceType, LineItem, Membership, MembershipType, ProfileStatus, Role,
    RouteDetails, TripType, User,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::StorageError(format!("serialization failed: {}", err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
