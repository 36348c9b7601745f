use chrono::{DateTime, Utc};
use vela_core::{Membership, MembershipType, ProfileStatus, Role, User};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EligibilityError {
    #[error("Only customers can book flights ({0:?} accounts cannot)")]
    RoleNotAllowed(Role),

    #[error("Customer profile is not approved ({0:?})")]
    ProfileNotApproved(ProfileStatus),

    #[error("Booking limit reached ({count}/{limit})")]
    BookingLimitReached { count: u32, limit: u32 },

    #[error("Membership expired on {0}")]
    MembershipExpired(DateTime<Utc>),

    #[error("Cancellation rights used up ({count}/{limit})")]
    CancellationLimitReached { count: u32, limit: u32 },
}

/// Gate for creating a booking. Checks run in a fixed order and the first
/// failure is returned.
pub fn check_booking_eligibility(user: &User, now: DateTime<Utc>) -> Result<(), EligibilityError> {
    if user.role != Role::Customer {
        return Err(EligibilityError::RoleNotAllowed(user.role));
    }

    if user.profile_status != ProfileStatus::Approved {
        return Err(EligibilityError::ProfileNotApproved(user.profile_status));
    }

    let membership = &user.membership;
    if membership.membership_type == MembershipType::Standard
        && membership.booking_count >= membership.booking_limit
    {
        return Err(EligibilityError::BookingLimitReached {
            count: membership.booking_count,
            limit: membership.booking_limit,
        });
    }

    if let Some(expiry) = membership.expires_at.filter(|_| membership.is_expired(now)) {
        return Err(EligibilityError::MembershipExpired(expiry));
    }

    check_cancellation_rights(membership)
}

/// Free cancellations are capped per membership term.
pub fn check_cancellation_rights(membership: &Membership) -> Result<(), EligibilityError> {
    if membership.cancellation_count >= membership.cancellation_limit {
        return Err(EligibilityError::CancellationLimitReached {
            count: membership.cancellation_count,
            limit: membership.cancellation_limit,
        });
    }
    Ok(())
}

/// Remaining bookings for limited tiers; `None` means unlimited.
pub fn remaining_bookings(membership: &Membership) -> Option<u32> {
    match membership.membership_type {
        MembershipType::Standard => {
            Some(membership.booking_limit.saturating_sub(membership.booking_count))
        }
        MembershipType::Basic | MembershipType::Premium => None,
    }
}

pub fn remaining_cancellations(membership: &Membership) -> u32 {
    membership
        .cancellation_limit
        .saturating_sub(membership.cancellation_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn approved_customer(membership_type: MembershipType) -> User {
        let mut user = User::new("c@example.com".into(), "C".into(), Role::Customer, "h".into());
        user.profile_status = ProfileStatus::Approved;
        user.membership.membership_type = membership_type;
        if membership_type != MembershipType::Basic {
            user.membership.expires_at = Some(Utc::now() + Duration::days(100));
        }
        user
    }

    #[test]
    fn test_operator_and_admin_blocked() {
        for role in [Role::Operator, Role::Admin] {
            let mut user = approved_customer(MembershipType::Premium);
            user.role = role;
            assert_eq!(
                check_booking_eligibility(&user, Utc::now()),
                Err(EligibilityError::RoleNotAllowed(role))
            );
        }
    }

    #[test]
    fn test_unapproved_profile_blocked() {
        let mut user = approved_customer(MembershipType::Basic);
        user.profile_status = ProfileStatus::Pending;
        assert_eq!(
            check_booking_eligibility(&user, Utc::now()),
            Err(EligibilityError::ProfileNotApproved(ProfileStatus::Pending))
        );
    }

    #[test]
    fn test_standard_booking_limit_boundary() {
        let mut user = approved_customer(MembershipType::Standard);
        user.membership.booking_limit = 10;

        user.membership.booking_count = 9;
        assert!(check_booking_eligibility(&user, Utc::now()).is_ok());

        user.membership.booking_count = 10;
        assert_eq!(
            check_booking_eligibility(&user, Utc::now()),
            Err(EligibilityError::BookingLimitReached { count: 10, limit: 10 })
        );
    }

    #[test]
    fn test_premium_has_no_booking_limit() {
        let mut user = approved_customer(MembershipType::Premium);
        user.membership.booking_count = 50;
        assert!(check_booking_eligibility(&user, Utc::now()).is_ok());
        assert_eq!(remaining_bookings(&user.membership), None);
    }

    #[test]
    fn test_expired_membership_blocked() {
        let mut user = approved_customer(MembershipType::Premium);
        let expiry = Utc::now() - Duration::hours(1);
        user.membership.expires_at = Some(expiry);
        assert_eq!(
            check_booking_eligibility(&user, Utc::now()),
            Err(EligibilityError::MembershipExpired(expiry))
        );
    }

    #[test]
    fn test_cancellation_limit_blocks_booking() {
        let mut user = approved_customer(MembershipType::Basic);
        user.membership.cancellation_count = 10;
        assert_eq!(
            check_booking_eligibility(&user, Utc::now()),
            Err(EligibilityError::CancellationLimitReached { count: 10, limit: 10 })
        );
        assert_eq!(remaining_cancellations(&user.membership), 0);
    }
}
