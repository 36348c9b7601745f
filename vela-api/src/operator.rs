use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_booking::{overdue_reason, BookingError};
use vela_catalog::ListingDraft;
use vela_core::repository::{BookingRepository, ListingRepository, UserRepository};
use vela_core::{BookingRequest, BookingStatus, FlightListing};
use vela_shared::models::events::BookingEventKind;

use crate::bookings::{enforce_deadline, load_booking};
use crate::error::AppError;
use crate::middleware::auth::{operator_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ApproveRequest {
    /// Required for route bookings, refused for flight bookings.
    #[serde(default)]
    quoted_price_cents: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RejectRequest {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct PendingApproval {
    #[serde(flatten)]
    booking: BookingRequest,
    seconds_remaining: i64,
}

#[derive(Debug, Serialize)]
struct OperatorDashboard {
    active_listings: usize,
    pending_approvals: usize,
    awaiting_payment: usize,
    paid_bookings: usize,
    gross_sales_cents: i64,
    recent: Vec<BookingRequest>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/operator/listings", get(list_listings).post(create_listing))
        .route("/operator/listings/{id}/deactivate", post(deactivate_listing))
        .route("/operator/bookings", get(list_bookings))
        .route("/operator/bookings/pending", get(pending_approvals))
        .route("/operator/bookings/{id}/approve", post(approve_booking))
        .route("/operator/bookings/{id}/reject", post(reject_booking))
        .route("/operator/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(state, operator_auth_middleware))
}

async fn operator_bookings(state: &AppState, operator_id: Uuid) -> Result<Vec<BookingRequest>, AppError> {
    Ok(state
        .store
        .list_by_operator(operator_id)
        .await?
        .into_iter()
        .filter(|b| !b.is_deleted)
        .collect())
}

async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<FlightListing>), AppError> {
    let lead_hours = state.bookings.policy().min_lead_time_hours;
    let listing = draft.into_listing(claims.sub, Utc::now(), lead_hours)?;
    state.store.save_listing(&listing).await?;

    tracing::info!(
        "Operator {} listed {} -> {} at {}",
        claims.sub,
        listing.from,
        listing.to,
        listing.departure
    );
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn list_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FlightListing>>, AppError> {
    let listings = state
        .store
        .list_listings()
        .await?
        .into_iter()
        .filter(|l| l.operator_id == claims.sub)
        .collect();
    Ok(Json(listings))
}

async fn deactivate_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightListing>, AppError> {
    let mut listing = state
        .store
        .get_listing(id)
        .await?
        .filter(|l| l.operator_id == claims.sub)
        .ok_or_else(|| AppError::NotFoundError(format!("Listing {} not found", id)))?;

    listing.is_active = false;
    state.store.save_listing(&listing).await?;
    Ok(Json(listing))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingRequest>>, AppError> {
    Ok(Json(operator_bookings(&state, claims.sub).await?))
}

fn seconds_remaining(booking: &BookingRequest, now: DateTime<Utc>) -> i64 {
    booking
        .approval_deadline
        .map(|d| (d - now).num_seconds().max(0))
        .unwrap_or(0)
}

/// Oldest first, so the booking closest to its deadline is on top.
async fn pending_approvals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PendingApproval>>, AppError> {
    let now = Utc::now();
    let mut pending: Vec<PendingApproval> = operator_bookings(&state, claims.sub)
        .await?
        .into_iter()
        .filter(|b| b.status == BookingStatus::PendingOperatorApproval)
        .filter(|b| overdue_reason(b, now).is_none())
        .map(|booking| PendingApproval {
            seconds_remaining: seconds_remaining(&booking, now),
            booking,
        })
        .collect();
    pending.sort_by_key(|p| p.seconds_remaining);
    Ok(Json(pending))
}

async fn load_for_operator(
    state: &AppState,
    id: Uuid,
    claims: &Claims,
) -> Result<BookingRequest, AppError> {
    let booking = load_booking(state, id).await?;
    if booking.operator_id != claims.sub {
        return Err(BookingError::NotFound(id.to_string()).into());
    }
    Ok(booking)
}

async fn approve_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<BookingRequest>, AppError> {
    let now = Utc::now();
    let _guard = state.write_lock.lock().await;
    let mut booking = load_for_operator(&state, id, &claims).await?;
    enforce_deadline(&state, &mut booking, now).await?;

    let mut customer = state
        .store
        .get_user(booking.customer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Customer {} not found", booking.customer_id)))?;

    state
        .bookings
        .approve(&mut booking, &mut customer, claims.sub, req.quoted_price_cents, now)?;
    state.store.save_booking(&booking).await?;
    state.store.save_user(&customer).await?;
    state.publish(&booking, BookingEventKind::Approved);

    Ok(Json(booking))
}

async fn reject_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<BookingRequest>, AppError> {
    let now = Utc::now();
    let _guard = state.write_lock.lock().await;
    let mut booking = load_for_operator(&state, id, &claims).await?;
    enforce_deadline(&state, &mut booking, now).await?;

    let mut customer = state
        .store
        .get_user(booking.customer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Customer {} not found", booking.customer_id)))?;

    state
        .bookings
        .reject(&mut booking, &mut customer, claims.sub, req.reason)?;
    state.store.save_booking(&booking).await?;
    state.store.save_user(&customer).await?;
    state.publish(&booking, BookingEventKind::Rejected);

    Ok(Json(booking))
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<OperatorDashboard>, AppError> {
    let now = Utc::now();
    let bookings = operator_bookings(&state, claims.sub).await?;
    let active_listings = state
        .store
        .list_listings()
        .await?
        .iter()
        .filter(|l| l.operator_id == claims.sub && l.is_active)
        .count();

    let pending_approvals = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::PendingOperatorApproval)
        .filter(|b| overdue_reason(b, now).is_none())
        .count();
    let awaiting_payment = bookings.iter().filter(|b| b.awaiting_payment()).count();
    let paid: Vec<&BookingRequest> = bookings.iter().filter(|b| b.is_paid).collect();
    let gross_sales_cents = paid.iter().map(|b| b.amount_due_cents()).sum();

    Ok(Json(OperatorDashboard {
        active_listings,
        pending_approvals,
        awaiting_payment,
        paid_bookings: paid.len(),
        gross_sales_cents,
        recent: bookings.into_iter().take(10).collect(),
    }))
}
