use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use vela_booking::{BookingManager, InvoiceService, MockPaymentAdapter, PaymentOrchestrator};
use vela_core::payment::PaymentAdapter;
use vela_core::repository::Store;
use vela_core::BookingRequest;
use vela_membership::PlanCatalog;
use vela_shared::models::events::{BookingEvent, BookingEventKind};
use vela_store::Config;

use crate::middleware::resiliency::ResiliencyState;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Serializes read-modify-write flows on users, bookings and invoices.
    pub write_lock: Arc<Mutex<()>>,
    pub sse_tx: broadcast::Sender<BookingEvent>,
    pub auth: AuthConfig,
    pub bookings: Arc<BookingManager>,
    pub payments: Arc<PaymentOrchestrator>,
    pub invoices: Arc<InvoiceService>,
    pub plans: Arc<PlanCatalog>,
    pub resiliency: Arc<ResiliencyState>,
    pub sweep_interval: Duration,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self::with_payment_adapter(config, store, Arc::new(MockPaymentAdapter))
    }

    pub fn with_payment_adapter(
        config: &Config,
        store: Arc<dyn Store>,
        adapter: Arc<dyn PaymentAdapter>,
    ) -> Self {
        let (sse_tx, _) = broadcast::channel(100);
        let invoice_policy = config.invoice_policy();
        let currency = invoice_policy.currency.clone();

        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
            sse_tx,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
                bcrypt_cost: config.auth.bcrypt_cost,
            },
            bookings: Arc::new(BookingManager::new(config.booking_policy())),
            payments: Arc::new(PaymentOrchestrator::new(adapter, currency)),
            invoices: Arc::new(InvoiceService::new(invoice_policy)),
            plans: Arc::new(config.plan_catalog()),
            resiliency: Arc::new(ResiliencyState::default()),
            sweep_interval: Duration::from_secs(config.business_rules.sweep_interval_seconds.max(1)),
        }
    }

    /// Fire-and-forget; nobody listening is fine.
    pub fn publish(&self, booking: &BookingRequest, kind: BookingEventKind) {
        let event = BookingEvent {
            booking_id: booking.id,
            customer_id: booking.customer_id,
            operator_id: booking.operator_id,
            kind,
            timestamp: chrono::Utc::now().timestamp(),
        };
        let _ = self.sse_tx.send(event);
    }
}
