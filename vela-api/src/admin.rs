use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_booking::{InvoiceDraft, InvoiceService, InvoiceSummary};
use vela_core::repository::{BookingRepository, InvoiceRepository, UserRepository};
use vela_core::{
    BookingRequest, BookingStatus, Invoice, InvoiceStatus, ProfileStatus, Role,
};
use vela_shared::pii::mask_email;

use crate::auth::UserView;
use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    role: Option<Role>,
    profile_status: Option<ProfileStatus>,
}

#[derive(Debug, Deserialize)]
struct ListBookingsQuery {
    status: Option<BookingStatus>,
    #[serde(default)]
    include_deleted: bool,
}

#[derive(Debug, Deserialize)]
struct ListInvoicesQuery {
    status: Option<InvoiceStatus>,
    counterparty_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct UpdateInvoiceStatusRequest {
    status: InvoiceStatus,
}

#[derive(Debug, Serialize)]
struct AdminDashboard {
    customers: usize,
    operators: usize,
    pending_profiles: usize,
    active_bookings: usize,
    paid_bookings: usize,
    currency: String,
    commission_rate_percent: u32,
    invoices: InvoiceSummary,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/approve", post(approve_profile))
        .route("/admin/users/{id}/reject", post(reject_profile))
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/invoices", get(list_invoices).post(create_invoice))
        .route("/admin/invoices/summary", get(invoice_summary))
        .route("/admin/invoices/{id}/status", post(update_invoice_status))
        .route("/admin/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

// ============================================================================
// User Management Handlers
// ============================================================================

/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = state
        .store
        .list_users()
        .await?
        .iter()
        .filter(|u| query.role.is_none_or(|r| u.role == r))
        .filter(|u| query.profile_status.is_none_or(|s| u.profile_status == s))
        .map(UserView::from)
        .collect();
    Ok(Json(users))
}

async fn set_profile_status(
    state: &AppState,
    id: Uuid,
    status: ProfileStatus,
) -> Result<UserView, AppError> {
    let _guard = state.write_lock.lock().await;
    let mut user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("User {} not found", id)))?;

    if user.role != Role::Customer {
        return Err(AppError::ValidationError(
            "Only customer profiles need approval".into(),
        ));
    }

    user.profile_status = status;
    user.touch();
    state.store.save_user(&user).await?;

    tracing::info!("Profile {} set to {:?}", mask_email(&user.email), status);
    Ok(UserView::from(&user))
}

/// POST /admin/users/{id}/approve
async fn approve_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(set_profile_status(&state, id, ProfileStatus::Approved).await?))
}

/// POST /admin/users/{id}/reject
async fn reject_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(set_profile_status(&state, id, ProfileStatus::Rejected).await?))
}

// ============================================================================
// Booking Oversight Handlers
// ============================================================================

/// GET /admin/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingRequest>>, AppError> {
    let bookings = state
        .store
        .list_bookings()
        .await?
        .into_iter()
        .filter(|b| query.include_deleted || !b.is_deleted)
        .filter(|b| query.status.is_none_or(|s| b.status == s))
        .collect();
    Ok(Json(bookings))
}

// ============================================================================
// Invoice Handlers
// ============================================================================

/// GET /admin/invoices
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = state
        .store
        .list_invoices()
        .await?
        .into_iter()
        .filter(|i| query.status.is_none_or(|s| i.status == s))
        .filter(|i| query.counterparty_id.is_none_or(|c| i.counterparty_id == c))
        .collect();
    Ok(Json(invoices))
}

/// POST /admin/invoices
async fn create_invoice(
    State(state): State<AppState>,
    Json(draft): Json<InvoiceDraft>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    if state.store.get_user(draft.counterparty_id).await?.is_none() {
        return Err(AppError::NotFoundError(format!(
            "User {} not found",
            draft.counterparty_id
        )));
    }

    let sequence = state.store.next_invoice_sequence().await?;
    let invoice = state.invoices.create(draft, sequence, Utc::now())?;
    state.store.save_invoice(&invoice).await?;

    tracing::info!("Invoice {} issued for {} cents", invoice.number, invoice.total_cents);
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// POST /admin/invoices/{id}/status
async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInvoiceStatusRequest>,
) -> Result<Json<Invoice>, AppError> {
    let _guard = state.write_lock.lock().await;
    let mut invoice = state
        .store
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Invoice {} not found", id)))?;

    state.invoices.update_status(&mut invoice, req.status, Utc::now())?;
    state.store.save_invoice(&invoice).await?;
    Ok(Json(invoice))
}

/// GET /admin/invoices/summary
async fn invoice_summary(State(state): State<AppState>) -> Result<Json<InvoiceSummary>, AppError> {
    let invoices = state.store.list_invoices().await?;
    Ok(Json(InvoiceService::summarize(&invoices)))
}

/// GET /admin/dashboard
async fn dashboard(State(state): State<AppState>) -> Result<Json<AdminDashboard>, AppError> {
    let users = state.store.list_users().await?;
    let bookings = state.store.list_bookings().await?;
    let invoices = state.store.list_invoices().await?;

    Ok(Json(AdminDashboard {
        customers: users.iter().filter(|u| u.role == Role::Customer).count(),
        operators: users.iter().filter(|u| u.role == Role::Operator).count(),
        pending_profiles: users
            .iter()
            .filter(|u| u.role == Role::Customer && u.profile_status == ProfileStatus::Pending)
            .count(),
        active_bookings: bookings.iter().filter(|b| b.is_active()).count(),
        paid_bookings: bookings.iter().filter(|b| b.is_paid && !b.is_deleted).count(),
        currency: state.invoices.policy().currency.clone(),
        commission_rate_percent: state.invoices.policy().commission_rate_percent,
        invoices: InvoiceService::summarize(&invoices),
    }))
}
