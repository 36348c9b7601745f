use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_booking::{overdue_reason, BookingDraft, BookingError, ExpiryReason, PaymentReceipt};
use vela_core::models::CancellationDetails;
use vela_core::payment::CardDetails;
use vela_core::repository::{
    BookingRepository, InvoiceRepository, ListingRepository, UserRepository,
};
use vela_core::{BookingRequest, Role, RouteDetails, TripType};
use vela_membership::eligibility::{remaining_bookings, remaining_cancellations};
use vela_membership::{get_discount_info, DiscountInfo};
use vela_shared::format_usd;
use vela_shared::models::events::BookingEventKind;

use crate::auth::{current_user, UserView};
use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, Claims};
use crate::state::AppState;
use crate::worker::expire_if_overdue;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
enum CreateBookingRequest {
    Flight {
        listing_id: Uuid,
        passenger_count: u32,
        #[serde(default)]
        request_discount: bool,
        notes: Option<String>,
    },
    Route {
        operator_id: Uuid,
        from: String,
        to: String,
        /// Local time at `from`.
        departure: NaiveDateTime,
        /// Local time at `to`.
        return_departure: Option<NaiveDateTime>,
        trip_type: TripType,
        passenger_count: u32,
        #[serde(default)]
        request_discount: bool,
        notes: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayRequest {
    card: CardDetails,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    booking: BookingRequest,
    receipt: PaymentReceipt,
    invoice_numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    booking: BookingRequest,
    cancellation: CancellationDetails,
}

#[derive(Debug, Serialize)]
struct CustomerDashboard {
    user: UserView,
    remaining_bookings: Option<u32>,
    remaining_cancellations: u32,
    active_bookings: usize,
    awaiting_payment: usize,
    total_paid_cents: i64,
    total_refunded_cents: i64,
    upcoming: Vec<BookingRequest>,
    history: Vec<BookingRequest>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/bookings/{id}/submit", post(submit_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/pay", post(pay_booking))
        .route("/discounts/{operator_id}", get(discount_info))
        .route("/dashboard/customer", get(customer_dashboard))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

pub(crate) async fn load_booking(state: &AppState, id: Uuid) -> Result<BookingRequest, AppError> {
    state
        .store
        .get_booking(id)
        .await?
        .filter(|b| !b.is_deleted)
        .ok_or_else(|| BookingError::NotFound(id.to_string()).into())
}

/// A missed deadline fails the action and expires the booking on the spot.
pub(crate) async fn enforce_deadline(
    state: &AppState,
    booking: &mut BookingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let deadline = match overdue_reason(booking, now) {
        None => return Ok(()),
        Some(ExpiryReason::ApprovalWindow) => booking.approval_deadline,
        Some(ExpiryReason::PaymentWindow) => booking.payment_deadline,
    };
    expire_if_overdue(state, booking, now).await?;
    Err(BookingError::DeadlinePassed {
        deadline: deadline.unwrap_or(now),
    }
    .into())
}

fn owned_by(booking: BookingRequest, claims: &Claims) -> Result<BookingRequest, AppError> {
    if booking.customer_id != claims.sub {
        return Err(BookingError::NotFound(booking.id.to_string()).into());
    }
    Ok(booking)
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingRequest>), AppError> {
    let now = Utc::now();

    let draft = match req {
        CreateBookingRequest::Flight {
            listing_id,
            passenger_count,
            request_discount,
            notes,
        } => {
            let listing = state
                .store
                .get_listing(listing_id)
                .await?
                .ok_or_else(|| AppError::NotFoundError(format!("Listing {} not found", listing_id)))?;
            BookingDraft::Flight {
                listing,
                passenger_count,
                request_discount,
                notes,
            }
        }
        CreateBookingRequest::Route {
            operator_id,
            from,
            to,
            departure,
            return_departure,
            trip_type,
            passenger_count,
            request_discount,
            notes,
        } => {
            let operator = state.store.get_user(operator_id).await?;
            if !operator.is_some_and(|u| u.role == Role::Operator) {
                return Err(AppError::NotFoundError(format!("Operator {} not found", operator_id)));
            }
            BookingDraft::Route {
                operator_id,
                route: RouteDetails {
                    from,
                    to,
                    departure,
                    return_departure,
                },
                trip_type,
                passenger_count,
                request_discount,
                notes,
            }
        }
    };

    let _guard = state.write_lock.lock().await;
    let mut customer = current_user(&state, &claims).await?;
    let existing = state.store.list_by_customer(customer.id).await?;

    let booking = state.bookings.create(&mut customer, draft, &existing, now)?;
    state.store.save_booking(&booking).await?;
    state.store.save_user(&customer).await?;
    state.publish(&booking, BookingEventKind::Created);

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingRequest>>, AppError> {
    let bookings = state
        .store
        .list_by_customer(claims.sub)
        .await?
        .into_iter()
        .filter(|b| !b.is_deleted)
        .collect();
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingRequest>, AppError> {
    let booking = owned_by(load_booking(&state, id).await?, &claims)?;
    Ok(Json(booking))
}

async fn submit_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingRequest>, AppError> {
    let _guard = state.write_lock.lock().await;
    let mut booking = owned_by(load_booking(&state, id).await?, &claims)?;

    state.bookings.submit(&mut booking, claims.sub, Utc::now())?;
    state.store.save_booking(&booking).await?;
    state.publish(&booking, BookingEventKind::Submitted);

    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<CancelResponse>, AppError> {
    let now = Utc::now();
    let _guard = state.write_lock.lock().await;
    let mut booking = owned_by(load_booking(&state, id).await?, &claims)?;
    expire_if_overdue(&state, &mut booking, now).await?;

    let mut customer = current_user(&state, &claims).await?;
    let cancellation = state.bookings.cancel(&mut booking, &mut customer, req.reason, now)?;
    state.store.save_booking(&booking).await?;
    state.store.save_user(&customer).await?;
    state.publish(&booking, BookingEventKind::Cancelled);

    Ok(Json(CancelResponse {
        booking,
        cancellation,
    }))
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let _guard = state.write_lock.lock().await;
    let mut booking = owned_by(load_booking(&state, id).await?, &claims)?;

    state.bookings.soft_delete(&mut booking, claims.sub)?;
    state.store.save_booking(&booking).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let now = Utc::now();
    let _guard = state.write_lock.lock().await;
    let mut booking = owned_by(load_booking(&state, id).await?, &claims)?;
    enforce_deadline(&state, &mut booking, now).await?;

    let amount = state.bookings.check_payable(&booking, claims.sub, now)?;
    let receipt = state.payments.charge(booking.id, amount, &req.card).await?;
    state
        .bookings
        .mark_paid(&mut booking, receipt.transaction_id.clone(), receipt.paid_at)?;

    let sequences = [
        state.store.next_invoice_sequence().await?,
        state.store.next_invoice_sequence().await?,
        state.store.next_invoice_sequence().await?,
    ];
    let invoices = state.invoices.booking_invoices(sequences, &booking, now)?;
    for invoice in &invoices {
        state.store.save_invoice(invoice).await?;
    }
    state.store.save_booking(&booking).await?;
    state.publish(&booking, BookingEventKind::Paid);

    tracing::info!(
        "Booking {} paid with {} ({})",
        booking.id,
        receipt.masked_card,
        format_usd(receipt.amount_cents)
    );

    Ok(Json(PaymentResponse {
        booking,
        receipt,
        invoice_numbers: invoices.iter().map(|i| i.number.clone()).collect(),
    }))
}

async fn discount_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(operator_id): Path<Uuid>,
) -> Result<Json<DiscountInfo>, AppError> {
    let customer = current_user(&state, &claims).await?;
    let info = get_discount_info(
        &customer.membership,
        &operator_id,
        &state.bookings.policy().discount,
        Utc::now(),
    );
    Ok(Json(info))
}

async fn customer_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CustomerDashboard>, AppError> {
    let customer = current_user(&state, &claims).await?;
    let bookings: Vec<BookingRequest> = state
        .store
        .list_by_customer(customer.id)
        .await?
        .into_iter()
        .filter(|b| !b.is_deleted)
        .collect();

    let total_paid_cents = bookings
        .iter()
        .filter(|b| b.is_paid)
        .map(|b| b.amount_due_cents())
        .sum();
    let total_refunded_cents = bookings
        .iter()
        .filter_map(|b| b.cancellation.as_ref())
        .map(|c| c.refund_cents)
        .sum();

    let (mut upcoming, history): (Vec<_>, Vec<_>) =
        bookings.into_iter().partition(|b| b.is_active());
    upcoming.sort_by_key(|b| b.route.departure);

    Ok(Json(CustomerDashboard {
        remaining_bookings: remaining_bookings(&customer.membership),
        remaining_cancellations: remaining_cancellations(&customer.membership),
        active_bookings: upcoming.len(),
        awaiting_payment: upcoming.iter().filter(|b| b.awaiting_payment()).count(),
        total_paid_cents,
        total_refunded_cents,
        user: UserView::from(&customer),
        upcoming,
        history,
    }))
}
