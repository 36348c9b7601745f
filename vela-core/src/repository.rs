use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{BookingRequest, FlightListing, Invoice, User};
use crate::CoreResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save_user(&self, user: &User) -> CoreResult<()>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn list_users(&self) -> CoreResult<Vec<User>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let needle = email.trim().to_lowercase();
        Ok(self.list_users().await?.into_iter().find(|u| u.email == needle))
    }
}

/// Repository trait for booking requests. Bookings are never removed.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn save_booking(&self, booking: &BookingRequest) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<BookingRequest>>;

    async fn list_bookings(&self) -> CoreResult<Vec<BookingRequest>>;

    async fn list_by_customer(&self, customer_id: Uuid) -> CoreResult<Vec<BookingRequest>> {
        Ok(self
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| b.customer_id == customer_id)
            .collect())
    }

    async fn list_by_operator(&self, operator_id: Uuid) -> CoreResult<Vec<BookingRequest>> {
        Ok(self
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| b.operator_id == operator_id)
            .collect())
    }
}

/// Repository trait for invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn save_invoice(&self, invoice: &Invoice) -> CoreResult<()>;

    async fn get_invoice(&self, id: Uuid) -> CoreResult<Option<Invoice>>;

    async fn list_invoices(&self) -> CoreResult<Vec<Invoice>>;

    /// Monotonic counter used for human-readable invoice numbers.
    async fn next_invoice_sequence(&self) -> CoreResult<u64>;
}

/// Repository trait for operator flight listings
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn save_listing(&self, listing: &FlightListing) -> CoreResult<()>;

    async fn get_listing(&self, id: Uuid) -> CoreResult<Option<FlightListing>>;

    async fn list_listings(&self) -> CoreResult<Vec<FlightListing>>;
}

/// Everything the service needs from a backing store.
pub trait Store: UserRepository + BookingRepository + InvoiceRepository + ListingRepository {}

impl<T> Store for T where T: UserRepository + BookingRepository + InvoiceRepository + ListingRepository {}
