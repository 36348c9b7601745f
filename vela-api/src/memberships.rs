use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use vela_booking::PaymentReceipt;
use vela_core::payment::CardDetails;
use vela_core::repository::{InvoiceRepository, UserRepository};
use vela_core::MembershipType;
use vela_membership::{MembershipError, MembershipPlan};
use vela_shared::format_usd;
use vela_shared::pii::mask_email;

use crate::auth::{current_user, UserView};
use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PurchaseRequest {
    membership_type: MembershipType,
    card: CardDetails,
}

#[derive(Debug, Serialize)]
struct PurchaseResponse {
    user: UserView,
    plan: MembershipPlan,
    receipt: PaymentReceipt,
    invoice_number: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let purchase = Router::new()
        .route("/memberships/purchase", post(purchase_membership))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware));

    Router::new()
        .route("/memberships/plans", get(list_plans))
        .merge(purchase)
}

async fn list_plans(State(state): State<AppState>) -> Json<Vec<MembershipPlan>> {
    Json(state.plans.plans())
}

async fn purchase_membership(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let plan = state.plans.plan(req.membership_type);
    if plan.term_days.is_none() {
        return Err(MembershipError::NotPurchasable(req.membership_type).into());
    }

    let _guard = state.write_lock.lock().await;
    let mut user = current_user(&state, &claims).await?;
    let receipt = state
        .payments
        .charge(user.id, plan.price_cents, &req.card)
        .await?;

    let now = Utc::now();
    let plan = state
        .plans
        .activate(&mut user.membership, req.membership_type, now)?;
    user.touch();

    let sequence = state.store.next_invoice_sequence().await?;
    let invoice =
        state
            .invoices
            .membership_invoice(sequence, user.id, &plan, &receipt.transaction_id, now);
    state.store.save_invoice(&invoice).await?;
    state.store.save_user(&user).await?;

    tracing::info!(
        "{} membership purchased for {} by {}",
        plan.membership_type,
        format_usd(plan.price_cents),
        mask_email(&user.email)
    );

    Ok(Json(PurchaseResponse {
        user: UserView::from(&user),
        plan,
        receipt,
        invoice_number: invoice.number,
    }))
}
