//! HTTP routes for conference quotes, availability and bookings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

use super::availability::Slot;
use super::calculators::{checked_duration, BookedDuration, QuoteInput};
use super::models::BookingRequest;
use super::requests::{AvailabilityQuery, ListBookingsQuery, QuoteRequest, UpdateBookingRequest};
use super::responses::{BookingListResponse, BookingResponse, QuoteResponse};
use super::services::{AvailabilityReport, BookingError};
use super::wizard::{Confirmation, ConfirmationStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/conference/quote", post(quote))
        .route("/api/conference/availability", get(availability))
        .route("/api/conference/bookings", post(create_booking).get(list_bookings))
        .route(
            "/api/conference/bookings/:id",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
}

/// Price a booking as it is being filled in
async fn quote(State(state): State<AppState>, Json(req): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let duration = checked_duration(&req.start_time, &req.end_time).unwrap_or(BookedDuration::ZERO);
    let quote = state.conference.quote(&QuoteInput {
        duration,
        attendee_count: req.attendee_count,
        catering_needed: req.catering_needed,
        equipment_count: req.equipment_needed.len(),
        package_type: req.package_type,
    });

    let display_total = state
        .rates
        .display_price(quote.total, req.display_currency.unwrap_or_default())
        .await?;

    Ok(Json(QuoteResponse {
        quote,
        is_complete: !duration.is_zero(),
        display_total,
    }))
}

/// Blocking bookings for a date, and whether a window is free
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>> {
    let window = match (query.start_time.as_deref(), query.end_time.as_deref()) {
        (Some(start), Some(end)) => Some(Slot::parse(query.date, start, end).map_err(BookingError::from)?),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "startTime and endTime must be given together".to_string(),
            ))
        }
    };

    let report = state.conference.availability(query.date, window).await?;
    Ok(Json(report))
}

/// Submit a booking; an unconfirmed confirmation comes back as 202
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Confirmation>)> {
    let today = Utc::now().date_naive();
    let confirmation = state.submission.submit(&state.conference, request, today).await?;
    let status = match confirmation.status {
        ConfirmationStatus::Submitted => StatusCode::CREATED,
        ConfirmationStatus::Unconfirmed => StatusCode::ACCEPTED,
    };
    Ok((status, Json(confirmation)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<BookingListResponse>> {
    let bookings = state.conference.list_bookings(query.email.as_deref()).await?;
    Ok(Json(BookingListResponse {
        count: bookings.len(),
        bookings,
    }))
}

async fn get_booking(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<BookingResponse>> {
    let booking = state.conference.get_booking(id).await?;
    Ok(Json(booking.into()))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>> {
    let booking = state
        .conference
        .update_booking(id, req.status, req.special_requests)
        .await?;
    Ok(Json(booking.into()))
}

async fn cancel_booking(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<BookingResponse>> {
    let booking = state.conference.cancel(id).await?;
    Ok(Json(booking.into()))
}
