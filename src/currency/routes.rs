//! HTTP routes for exchange rates and conversions.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::AppState;

use super::{format_amount, CurrencyCode, ExchangeRates};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/currency/rates", get(get_rates).put(update_rates))
        .route("/api/currency/convert", get(convert))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRatesRequest {
    pub rates: BTreeMap<CurrencyCode, Decimal>,
    pub approved_by: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: Decimal,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_ghs: Decimal,
    pub currency: CurrencyCode,
    #[serde(with = "rust_decimal::serde::str")]
    pub converted: Decimal,
    pub display: String,
}

async fn get_rates(State(state): State<AppState>) -> Json<ExchangeRates> {
    Json(state.rates.current().await)
}

async fn update_rates(
    State(state): State<AppState>,
    Json(req): Json<UpdateRatesRequest>,
) -> Result<Json<ExchangeRates>> {
    let rates = state.rates.approve(req.rates, &req.approved_by).await?;
    Ok(Json(rates))
}

async fn convert(State(state): State<AppState>, Query(query): Query<ConvertQuery>) -> Result<Json<ConversionResponse>> {
    let currency: CurrencyCode = query.to.parse()?;
    let converted = state.rates.current().await.convert_from_ghs(query.amount, currency)?;

    Ok(Json(ConversionResponse {
        amount_ghs: query.amount,
        currency,
        converted,
        display: format_amount(converted, currency),
    }))
}
