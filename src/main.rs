use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wgh_booking::access_codes::{AccessCodeRegistry, JsonFileAccessCodeStore};
use wgh_booking::cache::AppCache;
use wgh_booking::conference::{
    ConferenceBookingStore, ConferenceService, InMemoryConferenceBookingStore, PgConferenceBookingStore,
    SubmissionSettings,
};
use wgh_booking::config::AppConfig;
use wgh_booking::currency::ExchangeRateBook;
use wgh_booking::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wgh_booking=debug")))
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    info!("Starting WGH booking service v{}", env!("CARGO_PKG_VERSION"));

    let bookings: Arc<dyn ConferenceBookingStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("connecting to Postgres")?;
            let store = PgConferenceBookingStore::new(pool);
            store.ensure_schema().await.context("creating conference_bookings table")?;
            info!("Conference bookings stored in Postgres");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set, conference bookings kept in memory");
            Arc::new(InMemoryConferenceBookingStore::new())
        }
    };

    info!(
        "Access codes stored in {}",
        config.access_code_store_path.display()
    );
    let access_codes = AccessCodeRegistry::new(Arc::new(JsonFileAccessCodeStore::new(
        config.access_code_store_path.clone(),
    )));

    info!(policy = ?config.submission_policy, "Booking submissions configured");
    let state = AppState {
        conference: Arc::new(ConferenceService::new(bookings, config.pricing.clone(), AppCache::new())),
        submission: Arc::new(SubmissionSettings::new(
            config.submission_policy,
            config.support_phone.clone(),
        )),
        access_codes: Arc::new(access_codes),
        rates: Arc::new(ExchangeRateBook::default()),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
