use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_core::{
    BookingRequest, Invoice, InvoiceDirection, InvoiceStatus, InvoiceType, LineItem,
};
use vela_membership::MembershipPlan;
use vela_shared::money::{percent_of, MAX_AMOUNT_CENTS};

/// Longest payment term accepted on a hand-raised invoice.
pub const MAX_DUE_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePolicy {
    /// Applied to invoices raised by hand. System invoices are tax-inclusive.
    pub tax_rate_percent: u32,
    pub commission_rate_percent: u32,
    pub due_days: i64,
    pub currency: String,
}

impl Default for InvoicePolicy {
    fn default() -> Self {
        Self {
            tax_rate_percent: 0,
            commission_rate_percent: 10,
            due_days: 14,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItemDraft {
    pub description: String,
    pub quantity: u32,
    pub unit_amount_cents: i64,
}

/// Admin-entered invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub direction: InvoiceDirection,
    pub invoice_type: InvoiceType,
    pub counterparty_id: Uuid,
    #[serde(default)]
    pub booking_id: Option<Uuid>,
    pub items: Vec<InvoiceItemDraft>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Overrides the default payment term.
    #[serde(default)]
    pub due_days: Option<i64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvoiceError {
    #[error("Invoice needs at least one line item")]
    NoItems,

    #[error("Invalid line item: {0}")]
    InvalidItem(String),

    #[error("Invoice {number} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        number: String,
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("Payment term must be between 0 and 365 days, got {0}")]
    InvalidTerm(i64),

    #[error("Booking {0} has no payable amount")]
    UnpricedBooking(Uuid),
}

/// Totals for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub invoice_count: usize,
    pub paid_cents: i64,
    pub pending_cents: i64,
    pub overdue_cents: i64,
    pub cancelled_cents: i64,
    pub outgoing_cents: i64,
    pub incoming_cents: i64,
    /// Pending plus overdue.
    pub outstanding_cents: i64,
}

pub struct InvoiceService {
    policy: InvoicePolicy,
}

impl InvoiceService {
    pub fn new(policy: InvoicePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &InvoicePolicy {
        &self.policy
    }

    /// `INV-2026-000042`
    pub fn format_number(sequence: u64, issued_at: DateTime<Utc>) -> String {
        format!("INV-{}-{:06}", issued_at.year(), sequence)
    }

    /// Build an invoice from an admin draft. Starts out pending.
    pub fn create(
        &self,
        draft: InvoiceDraft,
        sequence: u64,
        now: DateTime<Utc>,
    ) -> Result<Invoice, InvoiceError> {
        if draft.items.is_empty() {
            return Err(InvoiceError::NoItems);
        }

        let mut items = Vec::with_capacity(draft.items.len());
        for item in draft.items {
            if item.description.trim().is_empty() {
                return Err(InvoiceError::InvalidItem("description is required".into()));
            }
            if item.quantity == 0 {
                return Err(InvoiceError::InvalidItem(format!(
                    "'{}' has zero quantity",
                    item.description
                )));
            }
            if item.unit_amount_cents < 0 {
                return Err(InvoiceError::InvalidItem(format!(
                    "'{}' has a negative amount",
                    item.description
                )));
            }
            let line_total = item
                .unit_amount_cents
                .checked_mul(item.quantity as i64)
                .filter(|total| *total <= MAX_AMOUNT_CENTS);
            if line_total.is_none() {
                return Err(InvoiceError::InvalidItem(format!(
                    "'{}' exceeds the {} cent limit",
                    item.description, MAX_AMOUNT_CENTS
                )));
            }
            items.push(LineItem::new(item.description, item.quantity, item.unit_amount_cents));
        }

        let subtotal = items
            .iter()
            .try_fold(0i64, |acc, i| acc.checked_add(i.total_cents))
            .filter(|total| *total <= MAX_AMOUNT_CENTS);
        if subtotal.is_none() {
            return Err(InvoiceError::InvalidItem(format!(
                "invoice total exceeds the {} cent limit",
                MAX_AMOUNT_CENTS
            )));
        }

        let due_days = draft.due_days.unwrap_or(self.policy.due_days);
        if !(0..=MAX_DUE_DAYS).contains(&due_days) {
            return Err(InvoiceError::InvalidTerm(due_days));
        }
        let mut invoice = self.build(
            sequence,
            draft.direction,
            draft.invoice_type,
            draft.counterparty_id,
            draft.booking_id,
            items,
            self.policy.tax_rate_percent,
            now,
            due_days,
        );
        invoice.notes = draft.notes;
        Ok(invoice)
    }

    /// Receipt for a membership purchase, already settled.
    pub fn membership_invoice(
        &self,
        sequence: u64,
        customer_id: Uuid,
        plan: &MembershipPlan,
        transaction_id: &str,
        now: DateTime<Utc>,
    ) -> Invoice {
        let description = format!(
            "{} membership ({} days)",
            capitalize(&plan.membership_type.to_string()),
            plan.term_days.unwrap_or_default()
        );
        let mut invoice = self.build(
            sequence,
            InvoiceDirection::Outgoing,
            InvoiceType::Membership,
            customer_id,
            None,
            vec![LineItem::new(description, 1, plan.price_cents)],
            0,
            now,
            0,
        );
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(now);
        invoice.notes = Some(format!("Transaction {}", transaction_id));
        invoice
    }

    /// The three invoices a paid booking produces: the customer's receipt,
    /// the platform commission owed by the operator, and the operator's
    /// payout owed by the platform.
    pub fn booking_invoices(
        &self,
        sequences: [u64; 3],
        booking: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<[Invoice; 3], InvoiceError> {
        let total = booking.amount_due_cents();
        if total <= 0 {
            return Err(InvoiceError::UnpricedBooking(booking.id));
        }
        let commission = percent_of(total, self.policy.commission_rate_percent);
        let payout = total - commission;
        let route = format!("{} → {}", booking.route.from, booking.route.to);
        let due = self.policy.due_days;

        let mut customer_items = vec![LineItem::new(
            format!("Charter {} ({} pax)", route, booking.passenger_count),
            1,
            booking.base_price_cents.unwrap_or(total),
        )];
        if booking.discount.applied {
            customer_items.push(LineItem::new(
                format!("Membership discount {}%", booking.discount.percentage),
                1,
                -booking.discount.amount_cents,
            ));
        }

        let mut receipt = self.build(
            sequences[0],
            InvoiceDirection::Outgoing,
            InvoiceType::Booking,
            booking.customer_id,
            Some(booking.id),
            customer_items,
            0,
            now,
            0,
        );
        receipt.status = InvoiceStatus::Paid;
        receipt.paid_at = Some(now);
        receipt.notes = booking
            .transaction_id
            .as_ref()
            .map(|txn| format!("Transaction {}", txn));

        let commission_invoice = self.build(
            sequences[1],
            InvoiceDirection::Outgoing,
            InvoiceType::Commission,
            booking.operator_id,
            Some(booking.id),
            vec![LineItem::new(
                format!(
                    "Platform commission {}% on {}",
                    self.policy.commission_rate_percent, route
                ),
                1,
                commission,
            )],
            0,
            now,
            due,
        );

        let payout_invoice = self.build(
            sequences[2],
            InvoiceDirection::Incoming,
            InvoiceType::Booking,
            booking.operator_id,
            Some(booking.id),
            vec![LineItem::new(format!("Operator payout {}", route), 1, payout)],
            0,
            now,
            due,
        );

        Ok([receipt, commission_invoice, payout_invoice])
    }

    /// pending → paid | overdue | cancelled, overdue → paid | cancelled.
    /// Paid and cancelled invoices are closed.
    pub fn update_status(
        &self,
        invoice: &mut Invoice,
        to: InvoiceStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        use InvoiceStatus::*;

        let allowed = matches!(
            (invoice.status, to),
            (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid)
                | (Overdue, Cancelled)
        );
        if !allowed {
            return Err(InvoiceError::InvalidTransition {
                number: invoice.number.clone(),
                from: invoice.status,
                to,
            });
        }

        invoice.status = to;
        invoice.updated_at = now;
        if to == Paid {
            invoice.paid_at = Some(now);
        }
        tracing::info!("Invoice {} is now {:?}", invoice.number, to);
        Ok(())
    }

    /// Returns true if the invoice was flipped to overdue.
    pub fn mark_overdue_if_due(&self, invoice: &mut Invoice, now: DateTime<Utc>) -> bool {
        if invoice.status != InvoiceStatus::Pending || now <= invoice.due_at {
            return false;
        }
        invoice.status = InvoiceStatus::Overdue;
        invoice.updated_at = now;
        true
    }

    pub fn summarize(invoices: &[Invoice]) -> InvoiceSummary {
        invoices.iter().fold(InvoiceSummary::default(), |mut acc, inv| {
            acc.invoice_count += 1;
            match inv.status {
                InvoiceStatus::Paid => acc.paid_cents += inv.total_cents,
                InvoiceStatus::Pending => acc.pending_cents += inv.total_cents,
                InvoiceStatus::Overdue => acc.overdue_cents += inv.total_cents,
                InvoiceStatus::Cancelled => acc.cancelled_cents += inv.total_cents,
            }
            if inv.status != InvoiceStatus::Cancelled {
                match inv.direction {
                    InvoiceDirection::Outgoing => acc.outgoing_cents += inv.total_cents,
                    InvoiceDirection::Incoming => acc.incoming_cents += inv.total_cents,
                }
            }
            if inv.is_open() {
                acc.outstanding_cents += inv.total_cents;
            }
            acc
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        sequence: u64,
        direction: InvoiceDirection,
        invoice_type: InvoiceType,
        counterparty_id: Uuid,
        booking_id: Option<Uuid>,
        items: Vec<LineItem>,
        tax_rate_percent: u32,
        now: DateTime<Utc>,
        due_days: i64,
    ) -> Invoice {
        let subtotal_cents: i64 = items.iter().map(|i| i.total_cents).sum();
        let tax_cents = percent_of(subtotal_cents, tax_rate_percent);
        Invoice {
            id: Uuid::new_v4(),
            number: Self::format_number(sequence, now),
            direction,
            invoice_type,
            counterparty_id,
            booking_id,
            items,
            subtotal_cents,
            tax_cents,
            total_cents: subtotal_cents + tax_cents,
            currency: self.policy.currency.clone(),
            status: InvoiceStatus::Pending,
            notes: None,
            issued_at: now,
            due_at: Duration::try_days(due_days)
                .and_then(|term| now.checked_add_signed(term))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            paid_at: None,
            updated_at: now,
        }
    }
}

impl Default for InvoiceService {
    fn default() -> Self {
        Self::new(InvoicePolicy::default())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
