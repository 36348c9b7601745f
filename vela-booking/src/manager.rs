use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_catalog::{
    check_bookable, time_until_departure, validate_route, CatalogError, ListingError,
};
use vela_core::models::{CancellationDetails, DiscountDetails};
use vela_core::{
    BookingKind, BookingRequest, BookingStatus, FlightListing, RouteDetails, TripType, User,
};
use vela_membership::discount::{record_discount_use, release_discount_use};
use vela_membership::{
    apply_discount, check_booking_eligibility, check_cancellation_rights, get_discount_info,
    DiscountPolicy, EligibilityError,
};

use vela_shared::money::MAX_AMOUNT_CENTS;

use crate::cancellation::penalty_tier;

/// Largest cabin we accept for a custom route request.
pub const MAX_ROUTE_PASSENGERS: u32 = 19;

/// Windows and caps that drive the booking lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookingPolicy {
    pub approval_window_hours: i64,
    pub payment_window_hours: i64,
    pub min_lead_time_hours: i64,
    pub discount: DiscountPolicy,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            approval_window_hours: 3,
            payment_window_hours: 24,
            min_lead_time_hours: vela_catalog::MIN_LEAD_TIME_HOURS,
            discount: DiscountPolicy::default(),
        }
    }
}

/// What a customer asks for.
#[derive(Debug, Clone)]
pub enum BookingDraft {
    Flight {
        listing: FlightListing,
        passenger_count: u32,
        request_discount: bool,
        notes: Option<String>,
    },
    Route {
        operator_id: Uuid,
        route: RouteDetails,
        trip_type: TripType,
        passenger_count: u32,
        request_discount: bool,
        notes: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Cannot {action} a booking in status {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    #[error(transparent)]
    NotEligible(#[from] EligibilityError),

    #[error(transparent)]
    Schedule(#[from] CatalogError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("An active booking for this route already exists: {0}")]
    DuplicateBooking(Uuid),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Deadline passed at {deadline}")]
    DeadlinePassed { deadline: DateTime<Utc> },

    #[error("Booking is already paid")]
    AlreadyPaid,

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Enforces booking state transitions and the rules attached to each.
///
/// The manager never touches storage: callers load the booking and its
/// customer, apply a transition, and persist both records.
pub struct BookingManager {
    policy: BookingPolicy,
}

impl BookingManager {
    pub fn new(policy: BookingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Create a booking in `Pending`. Counts against the customer's booking
    /// limit.
    pub fn create(
        &self,
        customer: &mut User,
        draft: BookingDraft,
        existing: &[BookingRequest],
        now: DateTime<Utc>,
    ) -> Result<BookingRequest, BookingError> {
        check_booking_eligibility(customer, now)?;

        let lead = self.policy.min_lead_time_hours;
        let mut booking = match draft {
            BookingDraft::Flight {
                listing,
                passenger_count,
                request_discount,
                notes,
            } => {
                check_bookable(&listing, passenger_count, now, lead)?;
                let route = RouteDetails {
                    from: listing.from.clone(),
                    to: listing.to.clone(),
                    departure: listing.departure,
                    return_departure: None,
                };
                let mut booking = BookingRequest::new(
                    customer.id,
                    listing.operator_id,
                    BookingKind::Flight,
                    Some(listing.id),
                    route,
                    passenger_count,
                    TripType::OneWay,
                    Some(listing.price_cents),
                    request_discount,
                );
                booking.notes = notes;
                booking
            }
            BookingDraft::Route {
                operator_id,
                mut route,
                trip_type,
                passenger_count,
                request_discount,
                notes,
            } => {
                if passenger_count == 0 || passenger_count > MAX_ROUTE_PASSENGERS {
                    return Err(BookingError::Validation(format!(
                        "passenger count must be between 1 and {}",
                        MAX_ROUTE_PASSENGERS
                    )));
                }
                route.from = route.from.trim().to_uppercase();
                route.to = route.to.trim().to_uppercase();
                validate_route(&route, trip_type, now, lead)?;
                let mut booking = BookingRequest::new(
                    customer.id,
                    operator_id,
                    BookingKind::Route,
                    None,
                    route,
                    passenger_count,
                    trip_type,
                    None,
                    request_discount,
                );
                booking.notes = notes;
                booking
            }
        };

        if let Some(duplicate) = existing
            .iter()
            .find(|b| b.customer_id == customer.id && b.is_active() && is_same_trip(b, &booking))
        {
            return Err(BookingError::DuplicateBooking(duplicate.id));
        }

        booking.created_at = now;
        booking.updated_at = now;
        customer.membership.booking_count += 1;
        customer.touch();

        tracing::info!(
            "Booking {} created for customer {} ({} -> {})",
            booking.id,
            customer.id,
            booking.route.from,
            booking.route.to
        );
        Ok(booking)
    }

    /// Transition: Pending → Pending Operator Approval
    pub fn submit(
        &self,
        booking: &mut BookingRequest,
        customer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        ensure_owner(booking, customer_id)?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "submit",
            });
        }

        booking.approval_deadline = Some(now + Duration::hours(self.policy.approval_window_hours));
        booking.update_status(BookingStatus::PendingOperatorApproval);
        Ok(())
    }

    /// Transition: Pending Operator Approval → Confirmed (awaiting payment)
    ///
    /// Route bookings need `quoted_price_cents`; flight bookings keep the
    /// listing price. A requested discount is applied when the customer is
    /// still eligible and reserves one use against the caps.
    pub fn approve(
        &self,
        booking: &mut BookingRequest,
        customer: &mut User,
        operator_id: Uuid,
        quoted_price_cents: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        ensure_operator(booking, operator_id)?;
        if booking.status != BookingStatus::PendingOperatorApproval {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "approve",
            });
        }
        if let Some(deadline) = booking.approval_deadline.filter(|d| now > *d) {
            return Err(BookingError::DeadlinePassed { deadline });
        }
        if customer.id != booking.customer_id {
            return Err(BookingError::Validation("customer does not own booking".into()));
        }

        let base_price = match (booking.kind, quoted_price_cents) {
            (BookingKind::Route, Some(price)) if price > MAX_AMOUNT_CENTS => {
                return Err(BookingError::Validation(format!(
                    "quoted price exceeds the {} cent limit",
                    MAX_AMOUNT_CENTS
                )))
            }
            (BookingKind::Route, Some(price)) if price > 0 => price,
            (BookingKind::Route, _) => {
                return Err(BookingError::Validation(
                    "route bookings need a positive quoted price".into(),
                ))
            }
            (BookingKind::Flight, Some(_)) => {
                return Err(BookingError::Validation(
                    "flight bookings use the listing price".into(),
                ))
            }
            (BookingKind::Flight, None) => booking.base_price_cents.unwrap_or(0),
        };

        let mut discount = DiscountDetails {
            requested: booking.discount.requested,
            ..DiscountDetails::default()
        };
        let mut final_price = base_price;

        if booking.discount.requested {
            let info = get_discount_info(
                &customer.membership,
                &operator_id,
                &self.policy.discount,
                now,
            );
            if info.can_use_discount {
                let applied = apply_discount(base_price, info.discount_percentage);
                discount.applied = true;
                discount.percentage = applied.percentage;
                discount.amount_cents = applied.amount_cents;
                final_price = applied.final_price_cents;
                record_discount_use(&mut customer.membership, operator_id);
                customer.touch();
            } else {
                tracing::warn!(
                    "Discount requested on booking {} but customer {} is not eligible",
                    booking.id,
                    customer.id
                );
            }
        }

        booking.base_price_cents = Some(base_price);
        booking.final_price_cents = Some(final_price);
        booking.discount = discount;
        booking.payment_deadline = Some(now + Duration::hours(self.policy.payment_window_hours));
        booking.update_status(BookingStatus::Confirmed);

        tracing::info!("Booking {} approved by operator {}", booking.id, operator_id);
        Ok(())
    }

    /// Transition: Pending Operator Approval → Rejected by Operator
    ///
    /// The rejected request does not count against the booking limit.
    pub fn reject(
        &self,
        booking: &mut BookingRequest,
        customer: &mut User,
        operator_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), BookingError> {
        ensure_operator(booking, operator_id)?;
        if booking.status != BookingStatus::PendingOperatorApproval {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "reject",
            });
        }

        if reason.is_some() {
            booking.notes = reason;
        }
        booking.update_status(BookingStatus::RejectedByOperator);
        customer.membership.booking_count = customer.membership.booking_count.saturating_sub(1);
        customer.touch();

        tracing::info!("Booking {} rejected by operator {}", booking.id, operator_id);
        Ok(())
    }

    /// Amount the customer must pay now.
    pub fn check_payable(
        &self,
        booking: &BookingRequest,
        customer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, BookingError> {
        ensure_owner(booking, customer_id)?;
        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "pay",
            });
        }
        if booking.is_paid {
            return Err(BookingError::AlreadyPaid);
        }
        if let Some(deadline) = booking.payment_deadline.filter(|d| now > *d) {
            return Err(BookingError::DeadlinePassed { deadline });
        }

        let amount = booking.amount_due_cents();
        if amount <= 0 {
            return Err(BookingError::Validation("booking has no price".into()));
        }
        Ok(amount)
    }

    /// Records a successful charge.
    pub fn mark_paid(
        &self,
        booking: &mut BookingRequest,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if booking.is_paid {
            return Err(BookingError::AlreadyPaid);
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "pay",
            });
        }

        booking.is_paid = true;
        booking.paid_at = Some(now);
        booking.transaction_id = Some(transaction_id);
        booking.payment_deadline = None;
        booking.updated_at = now;
        Ok(())
    }

    /// Cancel on behalf of the customer.
    ///
    /// Paid bookings pay a penalty by time left to departure. Unpaid ones
    /// cancel free but use up one cancellation right, and give back any
    /// reserved discount use.
    pub fn cancel(
        &self,
        booking: &mut BookingRequest,
        customer: &mut User,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CancellationDetails, BookingError> {
        ensure_owner(booking, customer.id)?;
        if booking.is_deleted || booking.status.is_terminal() {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "cancel",
            });
        }

        let details = if booking.is_paid {
            let until =
                time_until_departure(&booking.route.from, booking.route.departure, now)?;
            let tier = penalty_tier(until);
            let (penalty_cents, refund_cents) = tier.split(booking.amount_due_cents());
            CancellationDetails {
                cancelled_at: now,
                reason,
                free_cancellation: false,
                penalty_percentage: tier.penalty_percentage,
                penalty_cents,
                refund_cents,
            }
        } else {
            check_cancellation_rights(&customer.membership)?;
            customer.membership.cancellation_count += 1;
            if booking.discount.applied {
                release_discount_use(&mut customer.membership, booking.operator_id);
            }
            customer.touch();
            CancellationDetails {
                cancelled_at: now,
                reason,
                free_cancellation: true,
                penalty_percentage: 0,
                penalty_cents: 0,
                refund_cents: 0,
            }
        };

        booking.cancellation = Some(details.clone());
        booking.update_status(BookingStatus::Cancelled);

        tracing::info!(
            "Booking {} cancelled (penalty {}%)",
            booking.id,
            details.penalty_percentage
        );
        Ok(details)
    }

    /// Hide a finished booking from the customer's dashboard.
    pub fn soft_delete(
        &self,
        booking: &mut BookingRequest,
        customer_id: Uuid,
    ) -> Result<(), BookingError> {
        ensure_owner(booking, customer_id)?;
        if !booking.status.is_terminal() {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                action: "delete",
            });
        }
        booking.is_deleted = true;
        booking.updated_at = Utc::now();
        Ok(())
    }
}

impl Default for BookingManager {
    fn default() -> Self {
        Self::new(BookingPolicy::default())
    }
}

fn ensure_owner(booking: &BookingRequest, customer_id: Uuid) -> Result<(), BookingError> {
    if booking.customer_id != customer_id {
        return Err(BookingError::Forbidden(format!(
            "booking {} belongs to another customer",
            booking.id
        )));
    }
    Ok(())
}

fn ensure_operator(booking: &BookingRequest, operator_id: Uuid) -> Result<(), BookingError> {
    if booking.operator_id != operator_id {
        return Err(BookingError::Forbidden(format!(
            "booking {} is assigned to another operator",
            booking.id
        )));
    }
    Ok(())
}

/// One booking per customer per route: the same listing for flights, the
/// same legs and departure for route requests.
fn is_same_trip(a: &BookingRequest, b: &BookingRequest) -> bool {
    match (a.listing_id, b.listing_id) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.route.same_route(&b.route),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::{MembershipType, ProfileStatus, Role};

    fn customer(membership_type: MembershipType) -> User {
        let mut user = User::new("c@example.com".into(), "C".into(), Role::Customer, "h".into());
        user.profile_status = ProfileStatus::Approved;
        user.membership.membership_type = membership_type;
        if membership_type != MembershipType::Basic {
            user.membership.expires_at = Some(Utc::now() + Duration::days(300));
        }
        user
    }

    fn route_draft(operator_id: Uuid, now: DateTime<Utc>, discount: bool) -> BookingDraft {
        BookingDraft::Route {
            operator_id,
            route: RouteDetails {
                from: "teb".into(),
                to: "PBI".into(),
                departure: now.naive_utc() + Duration::days(5),
                return_departure: None,
            },
            trip_type: TripType::OneWay,
            passenger_count: 4,
            request_discount: discount,
            notes: None,
        }
    }

    fn listing(operator_id: Uuid, now: DateTime<Utc>) -> FlightListing {
        FlightListing {
            id: Uuid::new_v4(),
            operator_id,
            from: "LBG".into(),
            to: "NCE".into(),
            departure: now.naive_utc() + Duration::days(2),
            aircraft: "Phenom 300".into(),
            seat_capacity: 7,
            price_cents: 1_800_000,
            is_active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_booking_lifecycle() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Premium);

        let mut booking = manager.create(&mut user, route_draft(operator, now, true), &[], now).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.route.from, "TEB");
        assert_eq!(user.membership.booking_count, 1);

        manager.submit(&mut booking, user.id, now).unwrap();
        assert_eq!(booking.status, BookingStatus::PendingOperatorApproval);
        assert_eq!(booking.approval_deadline, Some(now + Duration::hours(3)));

        manager.approve(&mut booking, &mut user, operator, Some(4_000_000), now).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.discount.applied);
        assert_eq!(booking.discount.percentage, 10);
        assert_eq!(booking.discount.amount_cents, 400_000);
        assert_eq!(booking.final_price_cents, Some(3_600_000));
        assert_eq!(user.membership.discount_uses_for(&operator), 1);

        let amount = manager.check_payable(&booking, user.id, now).unwrap();
        assert_eq!(amount, 3_600_000);
        manager.mark_paid(&mut booking, "txn_1".into(), now).unwrap();
        assert!(booking.is_paid);
        assert!(matches!(
            manager.check_payable(&booking, user.id, now),
            Err(BookingError::AlreadyPaid)
        ));
    }

    #[test]
    fn test_cannot_approve_pending_booking() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();

        let err = manager.approve(&mut booking, &mut user, operator, Some(100), now).unwrap_err();
        assert!(matches!(
            err,
            BookingError::InvalidTransition { from: BookingStatus::Pending, action: "approve" }
        ));
    }

    #[test]
    fn test_only_assigned_operator_approves() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();

        let err = manager
            .approve(&mut booking, &mut user, Uuid::new_v4(), Some(100), now)
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }

    #[test]
    fn test_approval_after_deadline_fails() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();

        let later = now + Duration::hours(3) + Duration::seconds(1);
        let err = manager.approve(&mut booking, &mut user, operator, Some(100), later).unwrap_err();
        assert!(matches!(err, BookingError::DeadlinePassed { .. }));
        assert_eq!(booking.status, BookingStatus::PendingOperatorApproval);
    }

    #[test]
    fn test_route_approval_needs_quote() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();

        assert!(matches!(
            manager.approve(&mut booking, &mut user, operator, None, now),
            Err(BookingError::Validation(_))
        ));
        assert!(matches!(
            manager.approve(&mut booking, &mut user, operator, Some(i64::MAX / 5), now),
            Err(BookingError::Validation(_))
        ));
        assert_eq!(booking.status, BookingStatus::PendingOperatorApproval);

        manager
            .approve(&mut booking, &mut user, operator, Some(MAX_AMOUNT_CENTS), now)
            .unwrap();
        assert_eq!(booking.final_price_cents, Some(MAX_AMOUNT_CENTS));
    }

    #[test]
    fn test_flight_booking_uses_listing_price() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let listing = listing(operator, now);

        let draft = BookingDraft::Flight {
            listing: listing.clone(),
            passenger_count: 3,
            request_discount: true,
            notes: None,
        };
        let mut booking = manager.create(&mut user, draft, &[], now).unwrap();
        assert_eq!(booking.listing_id, Some(listing.id));
        assert_eq!(booking.base_price_cents, Some(1_800_000));

        manager.submit(&mut booking, user.id, now).unwrap();
        manager.approve(&mut booking, &mut user, operator, None, now).unwrap();
        // Basic members request discounts in vain.
        assert!(!booking.discount.applied);
        assert_eq!(booking.final_price_cents, Some(1_800_000));
    }

    #[test]
    fn test_duplicate_route_blocked() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Premium);

        let first = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        let err = manager
            .create(&mut user, route_draft(operator, now, false), &[first.clone()], now)
            .unwrap_err();
        assert!(matches!(err, BookingError::DuplicateBooking(id) if id == first.id));

        // A cancelled booking no longer blocks the route.
        let mut cancelled = first;
        cancelled.status = BookingStatus::Cancelled;
        assert!(manager
            .create(&mut user, route_draft(operator, now, false), &[cancelled], now)
            .is_ok());
    }

    #[test]
    fn test_standard_booking_limit_enforced_on_create() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let mut user = customer(MembershipType::Standard);
        user.membership.booking_count = user.membership.booking_limit;

        let err = manager
            .create(&mut user, route_draft(Uuid::new_v4(), now, false), &[], now)
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::NotEligible(EligibilityError::BookingLimitReached { .. })
        ));
    }

    #[test]
    fn test_too_soon_departure_rejected() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let mut user = customer(MembershipType::Basic);
        let draft = BookingDraft::Route {
            operator_id: Uuid::new_v4(),
            route: RouteDetails {
                from: "LHR".into(),
                to: "GVA".into(),
                departure: now.naive_utc() + Duration::hours(1),
                return_departure: None,
            },
            trip_type: TripType::OneWay,
            passenger_count: 2,
            request_discount: false,
            notes: None,
        };
        assert!(matches!(
            manager.create(&mut user, draft, &[], now),
            Err(BookingError::Schedule(CatalogError::DepartureTooSoon { .. }))
        ));
        assert_eq!(user.membership.booking_count, 0);
    }

    #[test]
    fn test_paid_cancellation_penalty() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();
        manager.approve(&mut booking, &mut user, operator, Some(2_000_000), now).unwrap();
        manager.mark_paid(&mut booking, "txn_2".into(), now).unwrap();

        // TEB is UTC-5; departure is five local days out, so > 72h.
        let details = manager.cancel(&mut booking, &mut user, None, now).unwrap();
        assert!(!details.free_cancellation);
        assert_eq!(details.penalty_percentage, 25);
        assert_eq!(details.penalty_cents, 500_000);
        assert_eq!(details.refund_cents, 1_500_000);
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(user.membership.cancellation_count, 0);
    }

    #[test]
    fn test_free_cancellation_uses_right_and_releases_discount() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Premium);
        let mut booking = manager.create(&mut user, route_draft(operator, now, true), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();
        manager.approve(&mut booking, &mut user, operator, Some(1_000_000), now).unwrap();
        assert_eq!(user.membership.discount_uses_total, 1);

        let details = manager.cancel(&mut booking, &mut user, Some("plans changed".into()), now).unwrap();
        assert!(details.free_cancellation);
        assert_eq!(details.refund_cents, 0);
        assert_eq!(user.membership.cancellation_count, 1);
        assert_eq!(user.membership.discount_uses_total, 0);
    }

    #[test]
    fn test_free_cancellation_blocked_at_cap() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let mut user = customer(MembershipType::Premium);
        let mut booking = manager
            .create(&mut user, route_draft(Uuid::new_v4(), now, false), &[], now)
            .unwrap();
        user.membership.cancellation_count = user.membership.cancellation_limit;

        let err = manager.cancel(&mut booking, &mut user, None, now).unwrap_err();
        assert!(matches!(
            err,
            BookingError::NotEligible(EligibilityError::CancellationLimitReached { .. })
        ));
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_reject_returns_booking_slot() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Standard);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();

        manager.reject(&mut booking, &mut user, operator, Some("no crew".into())).unwrap();
        assert_eq!(booking.status, BookingStatus::RejectedByOperator);
        assert_eq!(booking.notes.as_deref(), Some("no crew"));
        assert_eq!(user.membership.booking_count, 0);
    }

    #[test]
    fn test_soft_delete_only_terminal() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager
            .create(&mut user, route_draft(Uuid::new_v4(), now, false), &[], now)
            .unwrap();

        assert!(manager.soft_delete(&mut booking, user.id).is_err());
        manager.cancel(&mut booking, &mut user, None, now).unwrap();
        manager.soft_delete(&mut booking, user.id).unwrap();
        assert!(booking.is_deleted);
        assert!(!booking.is_active());
    }

    #[test]
    fn test_other_customer_cannot_pay() {
        let manager = BookingManager::default();
        let now = Utc::now();
        let operator = Uuid::new_v4();
        let mut user = customer(MembershipType::Basic);
        let mut booking = manager.create(&mut user, route_draft(operator, now, false), &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();
        manager.approve(&mut booking, &mut user, operator, Some(500_000), now).unwrap();

        assert!(matches!(
            manager.check_payable(&booking, Uuid::new_v4(), now),
            Err(BookingError::Forbidden(_))
        ));
        let late = now + Duration::hours(25);
        assert!(matches!(
            manager.check_payable(&booking, user.id, late),
            Err(BookingError::DeadlinePassed { .. })
        ));
    }
}
