use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::info;
use vela_booking::InvoiceService;
use vela_catalog::ListingDraft;
use vela_core::{CoreError, CoreResult, MembershipType, ProfileStatus, Role, User};
use vela_core::repository::{
    InvoiceRepository, ListingRepository, Store, UserRepository,
};

use crate::app_config::Config;

pub const DEMO_CUSTOMER_EMAIL: &str = "customer@vela.demo";
pub const DEMO_OPERATOR_EMAIL: &str = "operator@vela.demo";
pub const DEMO_ADMIN_EMAIL: &str = "admin@vela.demo";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub listings_created: usize,
    pub invoices_created: usize,
}

/// Creates the demo accounts if they are missing. Safe to run on every
/// startup: existing emails are left alone.
pub async fn seed_demo_data(
    store: &dyn Store,
    config: &Config,
    now: DateTime<Utc>,
) -> CoreResult<SeedReport> {
    let mut report = SeedReport::default();
    if !config.seed.demo_accounts {
        return Ok(report);
    }
    if config.seed.demo_password.len() < 8 {
        return Err(CoreError::ValidationError(
            "seed.demo_password must be at least 8 characters".into(),
        ));
    }

    let password_hash = bcrypt::hash(&config.seed.demo_password, config.auth.bcrypt_cost)
        .map_err(|e| CoreError::InternalError(format!("bcrypt: {}", e)))?;

    let accounts = [
        (DEMO_CUSTOMER_EMAIL, "Avery Customer", Role::Customer),
        (DEMO_OPERATOR_EMAIL, "Skyline Charters", Role::Operator),
        (DEMO_ADMIN_EMAIL, "Vela Admin", Role::Admin),
    ];

    let catalog = config.plan_catalog();
    let invoices = InvoiceService::new(config.invoice_policy());

    for (email, name, role) in accounts {
        if store.find_by_email(email).await?.is_some() {
            continue;
        }

        let mut user = User::new(email.to_string(), name.to_string(), role, password_hash.clone());
        match role {
            Role::Customer => {
                user.profile_status = ProfileStatus::Approved;
                user.phone = Some("+1 212 555 0100".into());
                let plan = catalog
                    .activate(&mut user.membership, MembershipType::Premium, now)
                    .map_err(|e| CoreError::InternalError(e.to_string()))?;
                store.save_user(&user).await?;

                let sequence = store.next_invoice_sequence().await?;
                let invoice =
                    invoices.membership_invoice(sequence, user.id, &plan, "txn_demo_seed", now);
                store.save_invoice(&invoice).await?;
                report.invoices_created += 1;
            }
            Role::Operator => {
                user.company = Some("Skyline Charters LLC".into());
                store.save_user(&user).await?;

                // A week out, on the hour, in each airport's local time.
                let today = now.naive_utc();
                let base = today
                    .with_minute(0)
                    .and_then(|t| t.with_second(0))
                    .and_then(|t| t.with_nanosecond(0))
                    .unwrap_or(today)
                    + Duration::days(7);
                let drafts = [
                    ListingDraft {
                        from: "TEB".into(),
                        to: "PBI".into(),
                        departure: base,
                        aircraft: "Citation XLS+".into(),
                        seat_capacity: 8,
                        price_cents: 2_450_000,
                    },
                    ListingDraft {
                        from: "LBG".into(),
                        to: "NCE".into(),
                        departure: base + Duration::days(3),
                        aircraft: "Phenom 300E".into(),
                        seat_capacity: 6,
                        price_cents: 1_380_000,
                    },
                ];
                for draft in drafts {
                    let listing = draft
                        .into_listing(user.id, now, config.business_rules.min_lead_time_hours)
                        .map_err(|e| CoreError::InternalError(e.to_string()))?;
                    store.save_listing(&listing).await?;
                    report.listings_created += 1;
                }
            }
            Role::Admin => {
                store.save_user(&user).await?;
            }
        }
        report.users_created += 1;
    }

    info!(
        "Demo seed: {} users, {} listings, {} invoices",
        report.users_created, report.listings_created, report.invoices_created
    );
    Ok(report)
}
