use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use vela_core::payment::{CardDetails, PaymentAdapter, PaymentIntent, PaymentStatus};
use vela_shared::pii::mask_card_number;

/// Card number the mock gateway always declines.
pub const DECLINED_TEST_CARD: &str = "4000000000000002";
/// Card number that makes the mock gateway fail outright.
pub const GATEWAY_ERROR_TEST_CARD: &str = "4000000000000119";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PaymentError {
    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// Proof of a successful charge, handed back to the API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub intent_id: String,
    pub transaction_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub masked_card: String,
    pub paid_at: DateTime<Utc>,
}

pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>, currency: impl Into<String>) -> Self {
        Self {
            adapter,
            currency: currency.into(),
        }
    }

    /// Validate the card, create an intent and confirm it in one go.
    pub async fn charge(
        &self,
        reference_id: Uuid,
        amount_cents: i64,
        card: &CardDetails,
    ) -> Result<PaymentReceipt, PaymentError> {
        if amount_cents <= 0 {
            return Err(PaymentError::InvalidCard("amount must be positive".into()));
        }
        validate_card(card, Utc::now())?;

        let intent = self
            .adapter
            .create_intent(reference_id, amount_cents, &self.currency)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let confirmed = self
            .adapter
            .confirm_payment(&intent, card)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        match confirmed.status {
            PaymentStatus::Succeeded => {
                let transaction_id = confirmed
                    .transaction_id
                    .clone()
                    .ok_or_else(|| PaymentError::Provider("missing transaction id".into()))?;
                tracing::info!(
                    "Payment {} succeeded for {} ({} cents)",
                    transaction_id,
                    reference_id,
                    amount_cents
                );
                Ok(PaymentReceipt {
                    intent_id: confirmed.id,
                    transaction_id,
                    amount_cents,
                    currency: confirmed.currency,
                    masked_card: mask_card_number(card.number.expose()),
                    paid_at: Utc::now(),
                })
            }
            PaymentStatus::Declined => {
                tracing::warn!("Payment declined for {}", reference_id);
                Err(PaymentError::Declined("card was declined".into()))
            }
            other => Err(PaymentError::Provider(format!(
                "unexpected payment status {:?}",
                other
            ))),
        }
    }
}

/// Format checks only: Luhn, expiry, CVC and the name and address fields.
pub fn validate_card(card: &CardDetails, now: DateTime<Utc>) -> Result<(), PaymentError> {
    let number: String = card
        .number
        .expose()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if !(13..=19).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidCard("card number must be 13-19 digits".into()));
    }
    if !luhn_valid(&number) {
        return Err(PaymentError::InvalidCard("card number failed checksum".into()));
    }

    let (month, year) = parse_expiry(&card.expiry)
        .ok_or_else(|| PaymentError::InvalidCard("expiry must be MM/YY".into()))?;
    // Cards are valid through the last day of the expiry month.
    if (year, month) < (now.year(), now.month()) {
        return Err(PaymentError::InvalidCard("card has expired".into()));
    }

    let cvc = card.cvc.expose();
    if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidCard("CVC must be 3 or 4 digits".into()));
    }

    if card.cardholder.trim().is_empty() {
        return Err(PaymentError::InvalidCard("cardholder name is required".into()));
    }
    if card.billing_address.trim().is_empty() {
        return Err(PaymentError::InvalidCard("billing address is required".into()));
    }
    Ok(())
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn parse_expiry(expiry: &str) -> Option<(u32, i32)> {
    let (mm, yy) = expiry.trim().split_once('/')?;
    if mm.len() != 2 || yy.len() != 2 {
        return None;
    }
    let month: u32 = mm.parse().ok()?;
    let year: i32 = yy.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((month, 2000 + year))
}

/// Simulated gateway. Every valid card succeeds except the two test cards.
pub struct MockPaymentAdapter;

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn create_intent(
        &self,
        reference_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PaymentIntent {
            id: format!("pi_{}", Uuid::new_v4().simple()),
            reference_id,
            amount_cents,
            currency: currency.to_string(),
            status: PaymentStatus::RequiresPaymentMethod,
            transaction_id: None,
            created_at: Utc::now(),
        })
    }

    async fn confirm_payment(
        &self,
        intent: &PaymentIntent,
        card: &CardDetails,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let number: String = card
            .number
            .expose()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        if number == GATEWAY_ERROR_TEST_CARD {
            return Err("Simulated payment gateway failure".into());
        }

        let mut confirmed = intent.clone();
        if number == DECLINED_TEST_CARD {
            confirmed.status = PaymentStatus::Declined;
        } else {
            confirmed.status = PaymentStatus::Succeeded;
            confirmed.transaction_id = Some(format!("txn_{}", Uuid::new_v4().simple()));
        }
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vela_shared::Masked;

    fn card(number: &str) -> CardDetails {
        CardDetails {
            number: Masked(number.to_string()),
            expiry: "12/35".into(),
            cvc: Masked("123".into()),
            cardholder: "Jane Doe".into(),
            billing_address: "1 Main St".into(),
        }
    }

    fn orchestrator() -> PaymentOrchestrator {
        PaymentOrchestrator::new(Arc::new(MockPaymentAdapter), "USD")
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242424242424242"));
        assert!(luhn_valid("4000000000000002"));
        assert!(!luhn_valid("4242424242424241"));
    }

    #[test]
    fn test_validate_card_fields() {
        let now = Utc.with_ymd_and_hms(2030, 6, 15, 0, 0, 0).unwrap();
        assert!(validate_card(&card("4242 4242 4242 4242"), now).is_ok());

        let mut short = card("4242");
        short.number = Masked("424242424242".into());
        assert!(validate_card(&short, now).is_err());

        let mut expired = card("4242424242424242");
        expired.expiry = "05/30".into();
        assert!(validate_card(&expired, now).is_err());
        expired.expiry = "06/30".into();
        assert!(validate_card(&expired, now).is_ok());
        expired.expiry = "13/31".into();
        assert!(validate_card(&expired, now).is_err());

        let mut bad_cvc = card("4242424242424242");
        bad_cvc.cvc = Masked("12".into());
        assert!(validate_card(&bad_cvc, now).is_err());

        let mut no_name = card("4242424242424242");
        no_name.cardholder = "  ".into();
        assert!(validate_card(&no_name, now).is_err());
    }

    #[tokio::test]
    async fn test_successful_charge() {
        let booking_id = Uuid::new_v4();
        let receipt = orchestrator()
            .charge(booking_id, 2_500_000, &card("4242424242424242"))
            .await
            .unwrap();

        assert!(receipt.transaction_id.starts_with("txn_"));
        assert_eq!(receipt.amount_cents, 2_500_000);
        assert_eq!(receipt.currency, "USD");
        assert_eq!(receipt.masked_card, "**** **** **** 4242");
    }

    #[tokio::test]
    async fn test_declined_card() {
        let result = orchestrator()
            .charge(Uuid::new_v4(), 1000, &card(DECLINED_TEST_CARD))
            .await;
        assert!(matches!(result, Err(PaymentError::Declined(_))));
    }

    #[tokio::test]
    async fn test_gateway_failure() {
        let result = orchestrator()
            .charge(Uuid::new_v4(), 1000, &card(GATEWAY_ERROR_TEST_CARD))
            .await;
        assert!(matches!(result, Err(PaymentError::Provider(_))));
    }

    #[tokio::test]
    async fn test_invalid_card_never_reaches_gateway() {
        let result = orchestrator()
            .charge(Uuid::new_v4(), 1000, &card("1234567890123"))
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidCard(_))));
    }
}
