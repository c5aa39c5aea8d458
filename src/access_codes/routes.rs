//! HTTP routes for staff access codes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::AppState;

use super::models::{AccessCode, StaffRole};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/access-codes", post(issue_code).get(list_codes))
        .route("/api/access-codes/:code", delete(deactivate_code))
        .route("/api/access-codes/validate", post(validate_code))
        .route("/api/access-codes/redeem", post(redeem_code))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCodeRequest {
    pub role: StaffRole,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCodesQuery {
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodeRequest {
    pub code: String,
    #[serde(default)]
    pub expected_role: Option<StaffRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCodeRequest {
    pub code: String,
    pub role: StaffRole,
    pub used_by: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodeResponse {
    pub valid: bool,
    pub access_code: AccessCode,
}

#[derive(Debug, Serialize)]
pub struct CodeListResponse {
    pub count: usize,
    pub codes: Vec<AccessCode>,
}

fn required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

async fn issue_code(
    State(state): State<AppState>,
    Json(req): Json<IssueCodeRequest>,
) -> Result<(StatusCode, Json<AccessCode>)> {
    required(&req.created_by, "createdBy")?;
    let code = state.access_codes.issue(req.role, req.created_by.trim()).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

async fn list_codes(
    State(state): State<AppState>,
    Query(query): Query<ListCodesQuery>,
) -> Result<Json<CodeListResponse>> {
    let codes = state.access_codes.list_issued_by(query.created_by.trim()).await?;
    Ok(Json(CodeListResponse {
        count: codes.len(),
        codes,
    }))
}

async fn deactivate_code(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<AccessCode>> {
    let code = state.access_codes.deactivate(&code).await?;
    Ok(Json(code))
}

async fn validate_code(
    State(state): State<AppState>,
    Json(req): Json<ValidateCodeRequest>,
) -> Result<Json<ValidateCodeResponse>> {
    let access_code = state.access_codes.validate(&req.code, req.expected_role).await?;
    Ok(Json(ValidateCodeResponse {
        valid: true,
        access_code,
    }))
}

/// Signup step: check the code for the requested role and use it up
async fn redeem_code(
    State(state): State<AppState>,
    Json(req): Json<RedeemCodeRequest>,
) -> Result<Json<AccessCode>> {
    required(&req.used_by, "usedBy")?;
    let code = state
        .access_codes
        .redeem(&req.code, req.role, req.used_by.trim())
        .await?;
    Ok(Json(code))
}
