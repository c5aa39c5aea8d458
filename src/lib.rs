//! Conference booking and staff access service for the WGH hotel website.

pub mod access_codes;
pub mod cache;
pub mod codes;
pub mod conference;
pub mod config;
pub mod currency;
pub mod error;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::access_codes::AccessCodeRegistry;
use crate::cache::CacheStats;
use crate::conference::{ConferenceService, SubmissionSettings};
use crate::currency::ExchangeRateBook;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub conference: Arc<ConferenceService>,
    pub submission: Arc<SubmissionSettings>,
    pub access_codes: Arc<AccessCodeRegistry>,
    pub rates: Arc<ExchangeRateBook>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: state.conference.cache().stats(),
    })
}

/// Full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(conference::router())
        .merge(access_codes::router())
        .merge(currency::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
