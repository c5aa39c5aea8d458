//! Request DTOs for conference API endpoints.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;

use super::models::{BookingStatus, Equipment, PackageType};
use crate::currency::CurrencyCode;

/// Request to price a (possibly incomplete) booking
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub attendee_count: u32,
    #[serde(default)]
    pub catering_needed: bool,
    #[serde(default)]
    pub equipment_needed: BTreeSet<Equipment>,
    #[serde(default)]
    pub package_type: PackageType,
    /// Currency for the formatted total; amounts stay in GHS
    #[serde(default)]
    pub display_currency: Option<CurrencyCode>,
}

/// Query parameters for the availability lookup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Admin edit of a booking; at least one field must be present
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// Blank text clears the stored special requests
    #[serde(default)]
    pub special_requests: Option<String>,
}
