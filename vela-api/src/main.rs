use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vela_api::{app, worker::start_expiry_worker, AppState};
use vela_core::repository::Store;
use vela_store::{seed_demo_data, Config, InMemoryStore, RedisStore, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vela_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Vela API on port {}", config.server.port);

    let store: Arc<dyn Store> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Redis => {
            let redis = RedisStore::new(&config.store.redis_url)
                .await
                .context("Failed to connect to Redis")?;
            redis.ping().await.context("Redis did not answer PING")?;
            Arc::new(redis)
        }
    };

    let report = seed_demo_data(store.as_ref(), &config, Utc::now())
        .await
        .context("Failed to seed demo data")?;
    if report.users_created > 0 {
        tracing::info!(
            "Seeded {} demo accounts, {} listings, {} invoices",
            report.users_created,
            report.listings_created,
            report.invoices_created
        );
    }

    let app_state = AppState::new(&config, store);
    tokio::spawn(start_expiry_worker(app_state.clone()));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
