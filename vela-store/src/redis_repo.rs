use async_trait::async_trait;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use vela_core::repository::{
    BookingRepository, InvoiceRepository, ListingRepository, UserRepository,
};
use vela_core::{BookingRequest, CoreError, CoreResult, FlightListing, Invoice, User};

const USERS_KEY: &str = "vela:users";
const BOOKINGS_KEY: &str = "vela:bookings";
const INVOICES_KEY: &str = "vela:invoices";
const LISTINGS_KEY: &str = "vela:listings";
const INVOICE_SEQ_KEY: &str = "vela:invoice_seq";

/// One Redis hash per entity type, field = record id, value = JSON.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

fn storage_err(err: redis::RedisError) -> CoreError {
    CoreError::StorageError(format!("redis: {}", err))
}

impl RedisStore {
    pub async fn new(connection_string: &str) -> CoreResult<Self> {
        let client = redis::Client::open(connection_string).map_err(storage_err)?;
        Ok(Self { client })
    }

    /// Round-trips a PING so startup fails fast on a bad URL.
    pub async fn ping(&self) -> CoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn connection(&self) -> CoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(storage_err)
    }

    async fn hset_json<T: Serialize + Sync>(&self, key: &str, id: Uuid, value: &T) -> CoreResult<()> {
        let payload = serde_json::to_string(value)?;
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(key, id.to_string(), payload)
            .await
            .map_err(storage_err)?;
        debug!("HSET {} {}", key, id);
        Ok(())
    }

    async fn hget_json<T: DeserializeOwned>(&self, key: &str, id: Uuid) -> CoreResult<Option<T>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.hget(key, id.to_string()).await.map_err(storage_err)?;
        raw.map(|s| serde_json::from_str(&s).map_err(CoreError::from))
            .transpose()
    }

    async fn hvals_json<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Vec<T>> {
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn.hvals(key).await.map_err(storage_err)?;
        raw.iter()
            .map(|s| serde_json::from_str(s).map_err(CoreError::from))
            .collect()
    }
}

#[async_trait]
impl UserRepository for RedisStore {
    async fn save_user(&self, user: &User) -> CoreResult<()> {
        self.hset_json(USERS_KEY, user.id, user).await
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        self.hget_json(USERS_KEY, id).await
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let mut users: Vec<User> = self.hvals_json(USERS_KEY).await?;
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

#[async_trait]
impl BookingRepository for RedisStore {
    async fn save_booking(&self, booking: &BookingRequest) -> CoreResult<()> {
        self.hset_json(BOOKINGS_KEY, booking.id, booking).await
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<BookingRequest>> {
        self.hget_json(BOOKINGS_KEY, id).await
    }

    async fn list_bookings(&self) -> CoreResult<Vec<BookingRequest>> {
        let mut bookings: Vec<BookingRequest> = self.hvals_json(BOOKINGS_KEY).await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl InvoiceRepository for RedisStore {
    async fn save_invoice(&self, invoice: &Invoice) -> CoreResult<()> {
        self.hset_json(INVOICES_KEY, invoice.id, invoice).await
    }

    async fn get_invoice(&self, id: Uuid) -> CoreResult<Option<Invoice>> {
        self.hget_json(INVOICES_KEY, id).await
    }

    async fn list_invoices(&self) -> CoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.hvals_json(INVOICES_KEY).await?;
        invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(invoices)
    }

    async fn next_invoice_sequence(&self) -> CoreResult<u64> {
        let mut conn = self.connection().await?;
        conn.incr(INVOICE_SEQ_KEY, 1u64).await.map_err(storage_err)
    }
}

#[async_trait]
impl ListingRepository for RedisStore {
    async fn save_listing(&self, listing: &FlightListing) -> CoreResult<()> {
        self.hset_json(LISTINGS_KEY, listing.id, listing).await
    }

    async fn get_listing(&self, id: Uuid) -> CoreResult<Option<FlightListing>> {
        self.hget_json(LISTINGS_KEY, id).await
    }

    async fn list_listings(&self) -> CoreResult<Vec<FlightListing>> {
        let mut listings: Vec<FlightListing> = self.hvals_json(LISTINGS_KEY).await?;
        listings.sort_by_key(|l| l.departure);
        Ok(listings)
    }
}
