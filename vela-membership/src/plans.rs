use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use vela_core::{Membership, MembershipType};

use crate::discount::tier_percentage;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MembershipError {
    #[error("The {0} plan cannot be purchased")]
    NotPurchasable(MembershipType),
}

/// A purchasable plan as shown on the membership page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipPlan {
    pub membership_type: MembershipType,
    pub price_cents: i64,
    pub term_days: Option<i64>,
    pub discount_percentage: u32,
    pub booking_limit: Option<u32>,
}

/// Prices and limits for each tier, loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub standard_price_cents: i64,
    pub premium_price_cents: i64,
    pub term_days: i64,
    pub booking_limit: u32,
    pub cancellation_limit: u32,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            standard_price_cents: 500_000,
            premium_price_cents: 1_500_000,
            term_days: 365,
            booking_limit: vela_core::models::user::DEFAULT_BOOKING_LIMIT,
            cancellation_limit: vela_core::models::user::DEFAULT_CANCELLATION_LIMIT,
        }
    }
}

impl PlanCatalog {
    pub fn plan(&self, membership_type: MembershipType) -> MembershipPlan {
        let (price_cents, term_days, booking_limit) = match membership_type {
            MembershipType::Basic => (0, None, None),
            MembershipType::Standard => {
                (self.standard_price_cents, Some(self.term_days), Some(self.booking_limit))
            }
            MembershipType::Premium => (self.premium_price_cents, Some(self.term_days), None),
        };
        MembershipPlan {
            membership_type,
            price_cents,
            term_days,
            discount_percentage: tier_percentage(membership_type),
            booking_limit,
        }
    }

    pub fn plans(&self) -> Vec<MembershipPlan> {
        [MembershipType::Basic, MembershipType::Standard, MembershipType::Premium]
            .into_iter()
            .map(|t| self.plan(t))
            .collect()
    }

    /// Activates a purchased plan on `membership`.
    ///
    /// Renewing the same tier before it lapses extends from the current
    /// expiry. Counters and discount usage start fresh for the new term.
    pub fn activate(
        &self,
        membership: &mut Membership,
        membership_type: MembershipType,
        now: DateTime<Utc>,
    ) -> Result<MembershipPlan, MembershipError> {
        let plan = self.plan(membership_type);
        let term_days = plan
            .term_days
            .ok_or(MembershipError::NotPurchasable(membership_type))?;

        let start = match membership.expires_at {
            Some(expiry)
                if membership.membership_type == membership_type && expiry > now =>
            {
                expiry
            }
            _ => now,
        };

        membership.membership_type = membership_type;
        membership.expires_at = Some(start + Duration::days(term_days));
        membership.booking_count = 0;
        membership.booking_limit = self.booking_limit;
        membership.cancellation_count = 0;
        membership.cancellation_limit = self.cancellation_limit;
        membership.discount_uses_by_operator.clear();
        membership.discount_uses_total = 0;

        tracing::info!(
            "Membership activated: {} until {:?}",
            membership_type,
            membership.expires_at
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_plan_table() {
        let catalog = PlanCatalog::default();
        let plans = catalog.plans();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].price_cents, 0);
        assert_eq!(plans[1].discount_percentage, 5);
        assert_eq!(plans[1].booking_limit, Some(10));
        assert_eq!(plans[2].discount_percentage, 10);
        assert_eq!(plans[2].booking_limit, None);
    }

    #[test]
    fn test_basic_not_purchasable() {
        let catalog = PlanCatalog::default();
        let mut membership = Membership::default();
        assert_eq!(
            catalog.activate(&mut membership, MembershipType::Basic, Utc::now()),
            Err(MembershipError::NotPurchasable(MembershipType::Basic))
        );
    }

    #[test]
    fn test_activation_resets_counters() {
        let catalog = PlanCatalog::default();
        let now = Utc::now();
        let mut membership = Membership {
            booking_count: 7,
            cancellation_count: 3,
            discount_uses_total: 4,
            ..Membership::default()
        };
        membership.discount_uses_by_operator.insert(Uuid::new_v4(), 2);

        catalog.activate(&mut membership, MembershipType::Standard, now).unwrap();

        assert_eq!(membership.membership_type, MembershipType::Standard);
        assert_eq!(membership.expires_at, Some(now + Duration::days(365)));
        assert_eq!(membership.booking_count, 0);
        assert_eq!(membership.cancellation_count, 0);
        assert_eq!(membership.discount_uses_total, 0);
        assert!(membership.discount_uses_by_operator.is_empty());
    }

    #[test]
    fn test_renewal_extends_from_current_expiry() {
        let catalog = PlanCatalog::default();
        let now = Utc::now();
        let current_expiry = now + Duration::days(30);
        let mut membership = Membership {
            membership_type: MembershipType::Premium,
            expires_at: Some(current_expiry),
            ..Membership::default()
        };

        catalog.activate(&mut membership, MembershipType::Premium, now).unwrap();
        assert_eq!(membership.expires_at, Some(current_expiry + Duration::days(365)));
    }

    #[test]
    fn test_tier_change_starts_now() {
        let catalog = PlanCatalog::default();
        let now = Utc::now();
        let mut membership = Membership {
            membership_type: MembershipType::Standard,
            expires_at: Some(now + Duration::days(30)),
            ..Membership::default()
        };

        catalog.activate(&mut membership, MembershipType::Premium, now).unwrap();
        assert_eq!(membership.expires_at, Some(now + Duration::days(365)));
    }
}
