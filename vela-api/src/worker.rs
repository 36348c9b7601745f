use chrono::{DateTime, Utc};
use tokio::time::interval;
use tracing::{error, info, warn};
use vela_booking::{expire_booking, overdue_reason, ExpiryReason};
use vela_core::repository::{BookingRepository, InvoiceRepository, UserRepository};
use vela_core::BookingRequest;
use vela_shared::models::events::BookingEventKind;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub bookings_expired: usize,
    pub invoices_overdue: usize,
}

/// Periodic deadline sweep. Runs until the process exits.
pub async fn start_expiry_worker(state: AppState) {
    let mut ticker = interval(state.sweep_interval);
    info!("Expiry worker started, sweeping every {:?}", state.sweep_interval);

    loop {
        ticker.tick().await;
        match run_sweep(&state, Utc::now()).await {
            Ok(report) if report != SweepReport::default() => {
                info!(
                    "Sweep expired {} bookings, marked {} invoices overdue",
                    report.bookings_expired, report.invoices_overdue
                );
            }
            Ok(_) => {}
            Err(e) => error!("Sweep failed: {:?}", e),
        }
    }
}

/// Expires overdue bookings and flags overdue invoices.
pub async fn run_sweep(state: &AppState, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
    let _guard = state.write_lock.lock().await;
    let mut report = SweepReport::default();

    for mut booking in state.store.list_bookings().await? {
        if overdue_reason(&booking, now).is_none() {
            continue;
        }
        match expire_if_overdue(state, &mut booking, now).await {
            Ok(Some(_)) => report.bookings_expired += 1,
            Ok(None) => {}
            Err(e) => warn!("Could not expire booking {}: {:?}", booking.id, e),
        }
    }

    for mut invoice in state.store.list_invoices().await? {
        if !state.invoices.mark_overdue_if_due(&mut invoice, now) {
            continue;
        }
        match state.store.save_invoice(&invoice).await {
            Ok(()) => report.invoices_overdue += 1,
            Err(e) => warn!("Could not flag invoice {} overdue: {:?}", invoice.number, e),
        }
    }

    Ok(report)
}

/// Expires `booking` if a deadline has passed, persisting the booking and
/// the owner's released counters. Caller must hold the write lock.
pub async fn expire_if_overdue(
    state: &AppState,
    booking: &mut BookingRequest,
    now: DateTime<Utc>,
) -> Result<Option<ExpiryReason>, AppError> {
    if overdue_reason(booking, now).is_none() {
        return Ok(None);
    }

    let mut customer = state
        .store
        .get_user(booking.customer_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(format!("booking {} has no customer", booking.id))
        })?;

    let reason = expire_booking(booking, &mut customer, now);
    if reason.is_some() {
        state.store.save_user(&customer).await?;
        state.store.save_booking(booking).await?;
        state.publish(booking, BookingEventKind::Expired);
    }
    Ok(reason)
}
