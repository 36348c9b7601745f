use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;
use vela_core::repository::{
    BookingRepository, InvoiceRepository, ListingRepository, UserRepository,
};
use vela_core::{BookingRequest, CoreResult, FlightListing, Invoice, User};

/// Process-local store for development and tests. Same ordering rules as
/// [`crate::RedisStore`].
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    bookings: RwLock<HashMap<Uuid, BookingRequest>>,
    invoices: RwLock<HashMap<Uuid, Invoice>>,
    listings: RwLock<HashMap<Uuid, FlightListing>>,
    invoice_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn save_user(&self, user: &User) -> CoreResult<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn save_booking(&self, booking: &BookingRequest) -> CoreResult<()> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<BookingRequest>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_bookings(&self) -> CoreResult<Vec<BookingRequest>> {
        let mut bookings: Vec<BookingRequest> =
            self.bookings.read().await.values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
    async fn save_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        self.invoices.write().await.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, id: Uuid) -> CoreResult<Option<Invoice>> {
        Ok(self.invoices.read().await.get(&id).cloned())
    }

    async fn list_invoices(&self) -> CoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.invoices.read().await.values().cloned().collect();
        invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(invoices)
    }

    async fn next_invoice_sequence(&self) -> CoreResult<u64> {
        Ok(self.invoice_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ListingRepository for InMemoryStore {
    async fn save_listing(&self, listing: &FlightListing) -> CoreResult<()> {
        self.listings.write().await.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get_listing(&self, id: Uuid) -> CoreResult<Option<FlightListing>> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn list_listings(&self) -> CoreResult<Vec<FlightListing>> {
        let mut listings: Vec<FlightListing> =
            self.listings.read().await.values().cloned().collect();
        listings.sort_by_key(|l| l.departure);
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::Role;

    #[tokio::test]
    async fn test_user_roundtrip_and_email_lookup() {
        let store = InMemoryStore::new();
        let user = User::new("Pilot@Example.com".into(), "P".into(), Role::Operator, "h".into());
        store.save_user(&user).await.unwrap();

        assert_eq!(store.get_user(user.id).await.unwrap().unwrap().email, "pilot@example.com");
        let found = store.find_by_email(" PILOT@example.com ").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(store.get_user(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invoice_sequence_is_monotonic() {
        let store = InMemoryStore::new();
        assert_eq!(store.next_invoice_sequence().await.unwrap(), 1);
        assert_eq!(store.next_invoice_sequence().await.unwrap(), 2);
        assert_eq!(store.next_invoice_sequence().await.unwrap(), 3);
    }
}
