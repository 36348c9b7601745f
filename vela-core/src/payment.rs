use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_shared::Masked;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    Processing,
    Succeeded,
    Declined,
    Failed,
}

/// Card details as submitted by the customer. Never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub number: Masked<String>,
    /// `MM/YY`
    pub expiry: String,
    pub cvc: Masked<String>,
    pub cardholder: String,
    pub billing_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Booking or user the charge belongs to.
    pub reference_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Create a payment intent with the provider
    async fn create_intent(
        &self,
        reference_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>>;

    /// Charge the card against a previously created intent
    async fn confirm_payment(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>>;
}
