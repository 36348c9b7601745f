use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vela_core::{BookingRequest, BookingStatus, User};
use vela_membership::discount::release_discount_use;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    /// The operator did not answer within the approval window.
    ApprovalWindow,
    /// The customer did not pay within the payment window.
    PaymentWindow,
}

/// Which deadline, if any, has passed for `booking` at `now`.
/// A deadline is still open at exactly its instant.
pub fn overdue_reason(booking: &BookingRequest, now: DateTime<Utc>) -> Option<ExpiryReason> {
    if booking.is_deleted {
        return None;
    }
    match booking.status {
        BookingStatus::PendingOperatorApproval => booking
            .approval_deadline
            .filter(|deadline| now > *deadline)
            .map(|_| ExpiryReason::ApprovalWindow),
        BookingStatus::Confirmed if !booking.is_paid => booking
            .payment_deadline
            .filter(|deadline| now > *deadline)
            .map(|_| ExpiryReason::PaymentWindow),
        _ => None,
    }
}

/// Flip an overdue booking to `Expired`.
///
/// Unanswered requests give the booking slot back, as a rejection would.
/// Unpaid confirmations give back any discount use they reserved.
/// `customer` must be the booking's owner.
pub fn expire_booking(
    booking: &mut BookingRequest,
    customer: &mut User,
    now: DateTime<Utc>,
) -> Option<ExpiryReason> {
    let reason = overdue_reason(booking, now)?;
    if customer.id != booking.customer_id {
        tracing::error!(
            "Refusing to expire booking {}: customer {} is not the owner",
            booking.id,
            customer.id
        );
        return None;
    }

    match reason {
        ExpiryReason::ApprovalWindow => {
            customer.membership.booking_count =
                customer.membership.booking_count.saturating_sub(1);
        }
        ExpiryReason::PaymentWindow => {
            if booking.discount.applied {
                release_discount_use(&mut customer.membership, booking.operator_id);
            }
        }
    }
    customer.touch();

    booking.update_status(BookingStatus::Expired);
    booking.updated_at = now;

    tracing::info!("Booking {} expired ({:?})", booking.id, reason);
    Some(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{BookingDraft, BookingManager};
    use chrono::Duration;
    use uuid::Uuid;
    use vela_core::{MembershipType, ProfileStatus, Role, RouteDetails, TripType};

    fn setup(now: DateTime<Utc>) -> (BookingManager, User, BookingRequest, Uuid) {
        let manager = BookingManager::default();
        let operator = Uuid::new_v4();
        let mut user = User::new("e@example.com".into(), "E".into(), Role::Customer, "h".into());
        user.profile_status = ProfileStatus::Approved;
        user.membership.membership_type = MembershipType::Standard;
        user.membership.expires_at = Some(now + Duration::days(100));

        let draft = BookingDraft::Route {
            operator_id: operator,
            route: RouteDetails {
                from: "VNY".into(),
                to: "LAS".into(),
                departure: now.naive_utc() + Duration::days(4),
                return_departure: None,
            },
            trip_type: TripType::OneWay,
            passenger_count: 2,
            request_discount: true,
            notes: None,
        };
        let mut booking = manager.create(&mut user, draft, &[], now).unwrap();
        manager.submit(&mut booking, user.id, now).unwrap();
        (manager, user, booking, operator)
    }

    #[test]
    fn test_approval_window_boundary() {
        let now = Utc::now();
        let (_, mut user, mut booking, _) = setup(now);
        let deadline = now + Duration::hours(3);

        assert_eq!(overdue_reason(&booking, deadline), None);
        assert_eq!(
            expire_booking(&mut booking, &mut user, deadline + Duration::seconds(1)),
            Some(ExpiryReason::ApprovalWindow)
        );
        assert_eq!(booking.status, BookingStatus::Expired);
        assert_eq!(user.membership.booking_count, 0);
    }

    #[test]
    fn test_payment_window_releases_discount() {
        let now = Utc::now();
        let (manager, mut user, mut booking, operator) = setup(now);
        manager
            .approve(&mut booking, &mut user, operator, Some(1_000_000), now)
            .unwrap();
        assert_eq!(user.membership.discount_uses_total, 1);

        let later = now + Duration::hours(24) + Duration::minutes(1);
        assert_eq!(
            expire_booking(&mut booking, &mut user, later),
            Some(ExpiryReason::PaymentWindow)
        );
        assert_eq!(user.membership.discount_uses_total, 0);
        assert_eq!(user.membership.booking_count, 1);
    }

    #[test]
    fn test_paid_booking_never_expires() {
        let now = Utc::now();
        let (manager, mut user, mut booking, operator) = setup(now);
        manager
            .approve(&mut booking, &mut user, operator, Some(1_000_000), now)
            .unwrap();
        manager.mark_paid(&mut booking, "txn_x".into(), now).unwrap();

        assert_eq!(expire_booking(&mut booking, &mut user, now + Duration::days(3)), None);
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }
}
