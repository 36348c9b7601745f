use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Operator,
    Admin,
}

/// Customer profiles must be approved by an admin before they can book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    Basic,
    Standard,
    Premium,
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MembershipType::Basic => "basic",
            MembershipType::Standard => "standard",
            MembershipType::Premium => "premium",
        };
        f.write_str(s)
    }
}

pub const DEFAULT_BOOKING_LIMIT: u32 = 10;
pub const DEFAULT_CANCELLATION_LIMIT: u32 = 10;

/// Membership state carried on every user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    pub membership_type: MembershipType,
    /// `None` for basic memberships, which never expire.
    pub expires_at: Option<DateTime<Utc>>,
    pub booking_count: u32,
    pub booking_limit: u32,
    pub cancellation_count: u32,
    pub cancellation_limit: u32,
    #[serde(default)]
    pub discount_uses_by_operator: HashMap<Uuid, u32>,
    #[serde(default)]
    pub discount_uses_total: u32,
}

impl Default for Membership {
    fn default() -> Self {
        Self {
            membership_type: MembershipType::Basic,
            expires_at: None,
            booking_count: 0,
            booking_limit: DEFAULT_BOOKING_LIMIT,
            cancellation_count: 0,
            cancellation_limit: DEFAULT_CANCELLATION_LIMIT,
            discount_uses_by_operator: HashMap::new(),
            discount_uses_total: 0,
        }
    }
}

impl Membership {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    pub fn discount_uses_for(&self, operator_id: &Uuid) -> u32 {
        self.discount_uses_by_operator.get(operator_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Role,
    pub profile_status: ProfileStatus,
    pub password_hash: String,
    pub membership: Membership,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Operators and admins are approved on creation; customers wait for an admin.
    pub fn new(email: String, name: String, role: Role, password_hash: String) -> Self {
        let now = Utc::now();
        let profile_status = match role {
            Role::Customer => ProfileStatus::Pending,
            Role::Operator | Role::Admin => ProfileStatus::Approved,
        };
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            name,
            phone: None,
            company: None,
            role,
            profile_status,
            password_hash,
            membership: Membership::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_customer_is_pending_basic() {
        let user = User::new("Jane@Example.com ".into(), "Jane".into(), Role::Customer, "x".into());
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.profile_status, ProfileStatus::Pending);
        assert_eq!(user.membership.membership_type, MembershipType::Basic);
        assert_eq!(user.membership.booking_limit, DEFAULT_BOOKING_LIMIT);
    }

    #[test]
    fn test_operator_is_approved() {
        let user = User::new("ops@example.com".into(), "Ops".into(), Role::Operator, "x".into());
        assert_eq!(user.profile_status, ProfileStatus::Approved);
    }

    #[test]
    fn test_membership_expiry() {
        let now = Utc::now();
        let mut membership = Membership::default();
        assert!(!membership.is_expired(now));

        membership.expires_at = Some(now - Duration::seconds(1));
        assert!(membership.is_expired(now));

        membership.expires_at = Some(now + Duration::days(30));
        assert!(!membership.is_expired(now));
    }
}
