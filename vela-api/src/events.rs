use std::convert::Infallible;

use axum::{
    extract::State,
    middleware,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use vela_core::Role;
use vela_shared::models::events::BookingEvent;

use crate::middleware::auth::{user_auth_middleware, Claims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/events", get(booking_events))
        .route_layer(middleware::from_fn_with_state(state, user_auth_middleware))
}

/// Customers see their own bookings, operators see bookings addressed to
/// them, admins see everything.
fn visible_to(claims: &Claims, event: &BookingEvent) -> bool {
    match claims.role {
        Role::Admin => true,
        Role::Operator => event.operator_id == claims.sub,
        Role::Customer => event.customer_id == claims.sub,
    }
}

async fn booking_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let claims = claims.clone();
        async move {
            // Lagged receivers skip what they missed.
            let event = result.ok()?;
            if !visible_to(&claims, &event) {
                return None;
            }
            match Event::default().event("booking").json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::warn!("Dropping unencodable booking event: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vela_shared::models::events::BookingEventKind;

    fn claims(role: Role, sub: Uuid) -> Claims {
        Claims {
            sub,
            email: "someone@vela.test".into(),
            role,
            exp: 0,
        }
    }

    #[test]
    fn test_event_visibility_by_role() {
        let customer = Uuid::new_v4();
        let operator = Uuid::new_v4();
        let event = BookingEvent {
            booking_id: Uuid::new_v4(),
            customer_id: customer,
            operator_id: operator,
            kind: BookingEventKind::Submitted,
            timestamp: 0,
        };

        assert!(visible_to(&claims(Role::Customer, customer), &event));
        assert!(!visible_to(&claims(Role::Customer, Uuid::new_v4()), &event));
        assert!(visible_to(&claims(Role::Operator, operator), &event));
        assert!(!visible_to(&claims(Role::Operator, customer), &event));
        assert!(visible_to(&claims(Role::Admin, Uuid::new_v4()), &event));
    }
}
