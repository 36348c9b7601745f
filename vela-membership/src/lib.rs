pub mod plans;
pub mod discount;
pub mod eligibility;

pub use plans::{MembershipError, MembershipPlan, PlanCatalog};
pub use discount::{
    apply_discount, get_discount_info, AppliedDiscount, DiscountInfo, DiscountPolicy,
};
pub use eligibility::{check_booking_eligibility, check_cancellation_rights, EligibilityError};
