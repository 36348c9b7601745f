use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use vela_core::repository::InvoiceRepository;
use vela_core::Invoice;

use crate::error::AppError;
use crate::middleware::auth::{user_auth_middleware, Claims};
use crate::state::AppState;

/// Invoices addressed to the caller. Admin views live under `/admin`.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_own))
        .route("/invoices/{id}", get(get_own))
        .route_layer(middleware::from_fn_with_state(state, user_auth_middleware))
}

async fn list_own(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = state
        .store
        .list_invoices()
        .await?
        .into_iter()
        .filter(|i| i.counterparty_id == claims.sub)
        .collect();
    Ok(Json(invoices))
}

async fn get_own(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    state
        .store
        .get_invoice(id)
        .await?
        .filter(|i| i.counterparty_id == claims.sub)
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Invoice {} not found", id)))
}
