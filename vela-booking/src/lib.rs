pub mod manager;
pub mod cancellation;
pub mod expiry;
pub mod orchestrator;
pub mod invoicing;

pub use manager::{BookingDraft, BookingError, BookingManager, BookingPolicy};
pub use cancellation::{penalty_tier, PenaltyTier};
pub use expiry::{expire_booking, overdue_reason, ExpiryReason};
pub use orchestrator::{MockPaymentAdapter, PaymentError, PaymentOrchestrator, PaymentReceipt};
pub use invoicing::{
    InvoiceDraft, InvoiceError, InvoiceItemDraft, InvoicePolicy, InvoiceService, InvoiceSummary,
};
