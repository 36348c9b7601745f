use chrono::Duration;
use serde::Serialize;
use vela_shared::money::percent_of;

/// Penalty and refund split for a paid booking.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PenaltyTier {
    pub penalty_percentage: u32,
    pub refund_percentage: u32,
}

impl PenaltyTier {
    const fn new(penalty_percentage: u32) -> Self {
        Self {
            penalty_percentage,
            refund_percentage: 100 - penalty_percentage,
        }
    }

    /// `(penalty, refund)` for an amount paid.
    pub fn split(&self, paid_cents: i64) -> (i64, i64) {
        let penalty = percent_of(paid_cents, self.penalty_percentage);
        (penalty, paid_cents - penalty)
    }
}

/// Penalty tier by time left before departure. Boundaries are exclusive:
/// exactly 72h falls in the 35% tier, exactly 24h in the 100% tier.
pub fn penalty_tier(until_departure: Duration) -> PenaltyTier {
    if until_departure > Duration::hours(72) {
        PenaltyTier::new(25)
    } else if until_departure > Duration::hours(48) {
        PenaltyTier::new(35)
    } else if until_departure > Duration::hours(24) {
        PenaltyTier::new(50)
    } else {
        PenaltyTier::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(penalty_tier(Duration::days(10)).penalty_percentage, 25);
        assert_eq!(penalty_tier(Duration::hours(60)).penalty_percentage, 35);
        assert_eq!(penalty_tier(Duration::hours(30)).penalty_percentage, 50);
        assert_eq!(penalty_tier(Duration::hours(2)).penalty_percentage, 100);
        assert_eq!(penalty_tier(Duration::hours(-5)).refund_percentage, 0);
    }

    #[test]
    fn test_boundaries_fall_in_lower_tier() {
        assert_eq!(penalty_tier(Duration::hours(72)), PenaltyTier::new(35));
        assert_eq!(penalty_tier(Duration::hours(48)), PenaltyTier::new(50));
        assert_eq!(penalty_tier(Duration::hours(24)), PenaltyTier::new(100));

        let just_over = Duration::hours(72) + Duration::seconds(1);
        assert_eq!(penalty_tier(just_over), PenaltyTier::new(25));
    }

    #[test]
    fn test_split() {
        let (penalty, refund) = PenaltyTier::new(35).split(2_000_000);
        assert_eq!(penalty, 700_000);
        assert_eq!(refund, 1_300_000);

        let (penalty, refund) = PenaltyTier::new(100).split(12_345);
        assert_eq!(penalty, 12_345);
        assert_eq!(refund, 0);
    }
}
