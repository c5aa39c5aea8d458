//! Response DTOs for conference API endpoints.

use serde::Serialize;

use super::models::{ConferenceBooking, Quote};

/// Response for a quote calculation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    /// False while the schedule is missing or has no positive duration
    pub is_complete: bool,
    pub display_total: String,
}

/// Response wrapping a single booking
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: ConferenceBooking,
}

impl From<ConferenceBooking> for BookingResponse {
    fn from(booking: ConferenceBooking) -> Self {
        Self {
            success: true,
            booking,
        }
    }
}

/// Response for booking listings
#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub count: usize,
    pub bookings: Vec<ConferenceBooking>,
}
