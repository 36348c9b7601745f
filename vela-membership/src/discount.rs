use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vela_core::{Membership, MembershipType};
use vela_shared::money::percent_of;

/// Usage caps for membership discounts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscountPolicy {
    pub per_operator_cap: u32,
    pub total_cap: u32,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            per_operator_cap: 2,
            total_cap: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscountInfo {
    pub discount_percentage: u32,
    pub can_use_discount: bool,
    pub remaining_operator_uses: u32,
    pub remaining_total_uses: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub percentage: u32,
    pub amount_cents: i64,
    pub final_price_cents: i64,
}

pub fn tier_percentage(membership_type: MembershipType) -> u32 {
    match membership_type {
        MembershipType::Basic => 0,
        MembershipType::Standard => 5,
        MembershipType::Premium => 10,
    }
}

/// Discount available to `membership` when booking with `operator_id`.
///
/// Basic members never get a discount. Paid tiers need an unexpired
/// membership and remaining uses under both the per-operator and the total
/// cap.
pub fn get_discount_info(
    membership: &Membership,
    operator_id: &Uuid,
    policy: &DiscountPolicy,
    now: DateTime<Utc>,
) -> DiscountInfo {
    let discount_percentage = tier_percentage(membership.membership_type);
    let remaining_operator_uses = policy
        .per_operator_cap
        .saturating_sub(membership.discount_uses_for(operator_id));
    let remaining_total_uses = policy.total_cap.saturating_sub(membership.discount_uses_total);

    let can_use_discount = discount_percentage > 0
        && !membership.is_expired(now)
        && remaining_operator_uses > 0
        && remaining_total_uses > 0;

    DiscountInfo {
        discount_percentage,
        can_use_discount,
        remaining_operator_uses,
        remaining_total_uses,
    }
}

/// Splits `price_cents` into discount and final price. Rounds the discount
/// half-up to whole cents.
pub fn apply_discount(price_cents: i64, percentage: u32) -> AppliedDiscount {
    let amount_cents = percent_of(price_cents, percentage);
    AppliedDiscount {
        percentage,
        amount_cents,
        final_price_cents: price_cents.saturating_sub(amount_cents),
    }
}

pub fn record_discount_use(membership: &mut Membership, operator_id: Uuid) {
    *membership.discount_uses_by_operator.entry(operator_id).or_insert(0) += 1;
    membership.discount_uses_total += 1;
}

/// Gives back a use reserved by a booking that was never paid.
pub fn release_discount_use(membership: &mut Membership, operator_id: Uuid) {
    if let Some(count) = membership.discount_uses_by_operator.get_mut(&operator_id) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            membership.discount_uses_by_operator.remove(&operator_id);
        }
    }
    membership.discount_uses_total = membership.discount_uses_total.saturating_sub(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn member(membership_type: MembershipType) -> Membership {
        Membership {
            membership_type,
            expires_at: match membership_type {
                MembershipType::Basic => None,
                _ => Some(Utc::now() + Duration::days(200)),
            },
            ..Membership::default()
        }
    }

    #[test]
    fn test_basic_never_discounts() {
        let operator = Uuid::new_v4();
        let policy = DiscountPolicy::default();

        let fresh = member(MembershipType::Basic);
        let info = get_discount_info(&fresh, &operator, &policy, Utc::now());
        assert_eq!(info.discount_percentage, 0);
        assert!(!info.can_use_discount);

        let mut used = member(MembershipType::Basic);
        used.discount_uses_total = 19;
        let info = get_discount_info(&used, &operator, &policy, Utc::now());
        assert!(!info.can_use_discount);
    }

    #[test]
    fn test_premium_with_no_uses() {
        let operator = Uuid::new_v4();
        let info = get_discount_info(
            &member(MembershipType::Premium),
            &operator,
            &DiscountPolicy::default(),
            Utc::now(),
        );
        assert_eq!(info.discount_percentage, 10);
        assert!(info.can_use_discount);
        assert_eq!(info.remaining_operator_uses, 2);
        assert_eq!(info.remaining_total_uses, 20);
    }

    #[test]
    fn test_standard_is_five_percent() {
        let info = get_discount_info(
            &member(MembershipType::Standard),
            &Uuid::new_v4(),
            &DiscountPolicy::default(),
            Utc::now(),
        );
        assert_eq!(info.discount_percentage, 5);
        assert!(info.can_use_discount);
    }

    #[test]
    fn test_per_operator_cap() {
        let operator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let policy = DiscountPolicy::default();
        let mut m = member(MembershipType::Premium);

        record_discount_use(&mut m, operator);
        record_discount_use(&mut m, operator);

        let info = get_discount_info(&m, &operator, &policy, Utc::now());
        assert_eq!(info.remaining_operator_uses, 0);
        assert!(!info.can_use_discount);

        let info = get_discount_info(&m, &other, &policy, Utc::now());
        assert!(info.can_use_discount);
        assert_eq!(info.remaining_total_uses, 18);
    }

    #[test]
    fn test_total_cap() {
        let mut m = member(MembershipType::Standard);
        m.discount_uses_total = 20;
        let info = get_discount_info(&m, &Uuid::new_v4(), &DiscountPolicy::default(), Utc::now());
        assert_eq!(info.remaining_total_uses, 0);
        assert!(!info.can_use_discount);
    }

    #[test]
    fn test_expired_membership_cannot_discount() {
        let mut m = member(MembershipType::Premium);
        m.expires_at = Some(Utc::now() - Duration::days(1));
        let info = get_discount_info(&m, &Uuid::new_v4(), &DiscountPolicy::default(), Utc::now());
        assert!(!info.can_use_discount);
    }

    #[test]
    fn test_apply_discount() {
        let applied = apply_discount(2_500_000, 10);
        assert_eq!(applied.amount_cents, 250_000);
        assert_eq!(applied.final_price_cents, 2_250_000);

        let applied = apply_discount(999, 5);
        assert_eq!(applied.amount_cents, 50);
        assert_eq!(applied.final_price_cents, 949);

        let none = apply_discount(1000, 0);
        assert_eq!(none.final_price_cents, 1000);

        let huge = apply_discount(i64::MAX / 5, 10);
        assert_eq!(huge.amount_cents + huge.final_price_cents, i64::MAX / 5);
        assert!(huge.final_price_cents > 0);
    }

    #[test]
    fn test_release_discount_use() {
        let operator = Uuid::new_v4();
        let mut m = member(MembershipType::Premium);
        record_discount_use(&mut m, operator);
        release_discount_use(&mut m, operator);
        assert_eq!(m.discount_uses_for(&operator), 0);
        assert_eq!(m.discount_uses_total, 0);

        release_discount_use(&mut m, operator);
        assert_eq!(m.discount_uses_total, 0);
    }
}
