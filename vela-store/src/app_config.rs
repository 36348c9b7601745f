use serde::Deserialize;
use std::env;
use vela_booking::{BookingPolicy, InvoicePolicy};
use vela_membership::{DiscountPolicy, PlanCatalog};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub memberships: MembershipConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub approval_window_hours: i64,
    pub payment_window_hours: i64,
    pub min_lead_time_hours: i64,
    pub booking_limit: u32,
    pub cancellation_limit: u32,
    pub discount_per_operator_cap: u32,
    pub discount_total_cap: u32,
    pub commission_rate_percent: u32,
    pub invoice_due_days: i64,
    #[serde(default)]
    pub tax_rate_percent: u32,
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MembershipConfig {
    pub standard_price_cents: i64,
    pub premium_price_cents: i64,
    pub term_days: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub demo_accounts: bool,
    pub demo_password: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `VELA__SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("VELA").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        let rules = &self.business_rules;
        BookingPolicy {
            approval_window_hours: rules.approval_window_hours,
            payment_window_hours: rules.payment_window_hours,
            min_lead_time_hours: rules.min_lead_time_hours,
            discount: DiscountPolicy {
                per_operator_cap: rules.discount_per_operator_cap,
                total_cap: rules.discount_total_cap,
            },
        }
    }

    pub fn invoice_policy(&self) -> InvoicePolicy {
        let rules = &self.business_rules;
        InvoicePolicy {
            tax_rate_percent: rules.tax_rate_percent,
            commission_rate_percent: rules.commission_rate_percent,
            due_days: rules.invoice_due_days,
            currency: rules.currency.clone(),
        }
    }

    pub fn plan_catalog(&self) -> PlanCatalog {
        PlanCatalog {
            standard_price_cents: self.memberships.standard_price_cents,
            premium_price_cents: self.memberships.premium_price_cents,
            term_days: self.memberships.term_days,
            booking_limit: self.business_rules.booking_limit,
            cancellation_limit: self.business_rules.cancellation_limit,
        }
    }
}

impl Default for Config {
    /// Mirrors `config/default.toml` with the in-memory backend.
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                redis_url: default_redis_url(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                jwt_expiration_seconds: 86_400,
                bcrypt_cost: default_bcrypt_cost(),
            },
            business_rules: BusinessRules {
                approval_window_hours: 3,
                payment_window_hours: 24,
                min_lead_time_hours: 3,
                booking_limit: 10,
                cancellation_limit: 10,
                discount_per_operator_cap: 2,
                discount_total_cap: 20,
                commission_rate_percent: 10,
                invoice_due_days: 14,
                tax_rate_percent: 0,
                sweep_interval_seconds: 60,
                currency: default_currency(),
            },
            memberships: MembershipConfig {
                standard_price_cents: 500_000,
                premium_price_cents: 1_500_000,
                term_days: 365,
            },
            seed: SeedConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies_follow_business_rules() {
        let mut config = Config::default();
        config.business_rules.discount_per_operator_cap = 3;
        config.business_rules.commission_rate_percent = 12;
        config.business_rules.booking_limit = 5;

        assert_eq!(config.booking_policy().discount.per_operator_cap, 3);
        assert_eq!(config.booking_policy().approval_window_hours, 3);
        assert_eq!(config.invoice_policy().commission_rate_percent, 12);
        assert_eq!(config.plan_catalog().booking_limit, 5);
    }

    #[test]
    fn test_backend_parses_lowercase() {
        let raw = config::Config::builder()
            .set_override("backend", "redis")
            .unwrap()
            .build()
            .unwrap();
        let store: StoreConfig = raw.try_deserialize().unwrap();
        assert_eq!(store.backend, StoreBackend::Redis);
        assert_eq!(store.redis_url, "redis://127.0.0.1:6379");
    }
}
