use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use vela_catalog::airports::all_airports;
use vela_catalog::{check_bookable, Airport};
use vela_core::repository::ListingRepository;
use vela_core::FlightListing;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ListingSearch {
    from: Option<String>,
    to: Option<String>,
    passengers: Option<u32>,
}

/// Public catalogue: no token needed.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airports", get(list_airports))
        .route("/listings", get(search_listings))
}

async fn list_airports() -> Json<&'static [Airport]> {
    Json(all_airports())
}

/// Listings that can still be booked right now, soonest departure first.
async fn search_listings(
    State(state): State<AppState>,
    Query(search): Query<ListingSearch>,
) -> Result<Json<Vec<FlightListing>>, AppError> {
    let now = Utc::now();
    let lead_hours = state.bookings.policy().min_lead_time_hours;
    let passengers = search.passengers.unwrap_or(1);

    let listings = state
        .store
        .list_listings()
        .await?
        .into_iter()
        .filter(|l| search.from.as_deref().is_none_or(|c| l.from.eq_ignore_ascii_case(c)))
        .filter(|l| search.to.as_deref().is_none_or(|c| l.to.eq_ignore_ascii_case(c)))
        .filter(|l| check_bookable(l, passengers, now, lead_hours).is_ok())
        .collect();
    Ok(Json(listings))
}
