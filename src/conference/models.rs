//! Conference booking domain types and database rows.
//!
//! Rows use sqlx's FromRow derive for direct database deserialization and
//! are converted into domain records before leaving the store.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;

/// Conference room pricing rules.
///
/// Passed explicitly into the quote engine so alternate pricing can be
/// used in tests and per deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRules {
    /// Room rate per hour for the hourly package
    pub hourly_rate: Decimal,
    /// Catering charge per attendee
    pub catering_rate: Decimal,
    /// Charge per distinct equipment item
    pub equipment_rate: Decimal,
    /// Flat rate for a full day, also the unit for multi-day events
    pub daily_rate: Decimal,
    /// Room capacity ceiling for attendee count
    pub capacity: u32,
    pub currency: String,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            hourly_rate: dec!(150),
            catering_rate: dec!(25),
            equipment_rate: dec!(50),
            daily_rate: dec!(900),
            capacity: 150,
            currency: "GHS".to_string(),
        }
    }
}

/// How the room portion of a quote is priced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    #[default]
    Hourly,
    HalfDay,
    FullDay,
    MultiDay,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Hourly => "hourly",
            PackageType::HalfDay => "half_day",
            PackageType::FullDay => "full_day",
            PackageType::MultiDay => "multi_day",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PackageType::Hourly => "Hourly Rental",
            PackageType::HalfDay => "Half Day (4 hours)",
            PackageType::FullDay => "Full Day (8+ hours)",
            PackageType::MultiDay => "Multi-Day Event",
        }
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(PackageType::Hourly),
            "half_day" => Ok(PackageType::HalfDay),
            "full_day" => Ok(PackageType::FullDay),
            "multi_day" => Ok(PackageType::MultiDay),
            other => Err(format!("unknown package type '{}'", other)),
        }
    }
}

/// Kind of event being hosted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "Corporate Meeting")]
    CorporateMeeting,
    #[serde(rename = "Workshop/Training")]
    WorkshopTraining,
    #[serde(rename = "Conference")]
    Conference,
    #[serde(rename = "Product Launch")]
    ProductLaunch,
    #[serde(rename = "Seminar")]
    Seminar,
    #[serde(rename = "Other")]
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::CorporateMeeting,
        EventType::WorkshopTraining,
        EventType::Conference,
        EventType::ProductLaunch,
        EventType::Seminar,
        EventType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventType::CorporateMeeting => "Corporate Meeting",
            EventType::WorkshopTraining => "Workshop/Training",
            EventType::Conference => "Conference",
            EventType::ProductLaunch => "Product Launch",
            EventType::Seminar => "Seminar",
            EventType::Other => "Other",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| format!("unknown event type '{}'", s))
    }
}

/// Equipment catalog, each item charged once regardless of quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Equipment {
    #[serde(rename = "HD Projector")]
    HdProjector,
    #[serde(rename = "Sound System")]
    SoundSystem,
    #[serde(rename = "Wireless Mic")]
    WirelessMic,
    #[serde(rename = "Whiteboard")]
    Whiteboard,
    #[serde(rename = "Video Conferencing")]
    VideoConferencing,
    #[serde(rename = "PA System")]
    PaSystem,
}

impl Equipment {
    pub const CATALOG: [Equipment; 6] = [
        Equipment::HdProjector,
        Equipment::SoundSystem,
        Equipment::WirelessMic,
        Equipment::Whiteboard,
        Equipment::VideoConferencing,
        Equipment::PaSystem,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Equipment::HdProjector => "HD Projector",
            Equipment::SoundSystem => "Sound System",
            Equipment::WirelessMic => "Wireless Mic",
            Equipment::Whiteboard => "Whiteboard",
            Equipment::VideoConferencing => "Video Conferencing",
            Equipment::PaSystem => "PA System",
        }
    }
}

impl FromStr for Equipment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Equipment::CATALOG
            .into_iter()
            .find(|e| e.label() == s)
            .ok_or_else(|| format!("unknown equipment '{}'", s))
    }
}

/// Lifecycle status of a conference booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Only confirmed and completed bookings hold the room
    pub fn blocks_slot(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Completed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// A complete conference booking request as submitted by the website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub organization_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub attendee_count: u32,
    pub event_type: EventType,
    #[serde(default)]
    pub catering_needed: bool,
    #[serde(default)]
    pub equipment_needed: BTreeSet<Equipment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub package_type: PackageType,
}

/// Itemized cost breakdown for a proposed booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(with = "rust_decimal::serde::str")]
    pub duration_hours: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub room_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub catering_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub equipment_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub currency: String,
    pub package_type: PackageType,
}

/// Booking handed to a store for creation
#[derive(Debug, Clone)]
pub struct NewConferenceBooking {
    pub booking_reference: String,
    pub request: BookingRequest,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub quote: Quote,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// A status move, valid only while the booking is still in `from`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

/// Admin edit of a stored booking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingUpdate {
    pub status: Option<StatusChange>,
    /// Replacement special requests; `Some(None)` clears them
    pub special_requests: Option<Option<String>>,
}

/// Persisted conference booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceBooking {
    pub id: Uuid,
    pub booking_reference: String,
    #[serde(flatten)]
    pub request: BookingRequest,
    pub quote: Quote,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row from conference_bookings
#[derive(Debug, Clone, FromRow)]
pub struct ConferenceBookingRow {
    pub id: Uuid,
    pub booking_reference: String,
    pub organization: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub event_type: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub expected_attendees: i32,
    pub package_type: String,
    pub requires_catering: bool,
    pub equipment: Vec<String>,
    pub special_requirements: Option<String>,
    pub duration_hours: Decimal,
    pub base_price: Decimal,
    pub catering_cost: Decimal,
    pub equipment_cost: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConferenceBookingRow {
    /// Convert the row into a domain record, rejecting unknown enum values
    pub fn into_booking(self) -> Result<ConferenceBooking, StoreError> {
        let event_type = self.event_type.parse::<EventType>().map_err(StoreError::Corrupt)?;
        let package_type = self
            .package_type
            .parse::<PackageType>()
            .map_err(StoreError::Corrupt)?;
        let status = self.status.parse::<BookingStatus>().map_err(StoreError::Corrupt)?;
        let equipment_needed = self
            .equipment
            .iter()
            .map(|e| e.parse::<Equipment>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(StoreError::Corrupt)?;
        let attendee_count = u32::try_from(self.expected_attendees)
            .map_err(|_| StoreError::Corrupt(format!("negative attendees on {}", self.id)))?;

        Ok(ConferenceBooking {
            id: self.id,
            booking_reference: self.booking_reference,
            request: BookingRequest {
                organization_name: self.organization,
                contact_person: self.contact_name,
                email: self.contact_email,
                phone: self.contact_phone,
                event_date: self.booking_date,
                start_time: self.start_time.format("%H:%M").to_string(),
                end_time: self.end_time.format("%H:%M").to_string(),
                attendee_count,
                event_type,
                catering_needed: self.requires_catering,
                equipment_needed,
                special_requests: self.special_requirements,
                package_type,
            },
            quote: Quote {
                duration_hours: self.duration_hours,
                room_cost: self.base_price,
                catering_cost: self.catering_cost,
                equipment_cost: self.equipment_cost,
                total: self.total_amount,
                currency: self.currency,
                package_type,
            },
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Slot columns of a conference_bookings row
#[derive(Debug, Clone, FromRow)]
pub struct BookedSlotRow {
    pub id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_confirmed_and_completed_block() {
        assert!(BookingStatus::Confirmed.blocks_slot());
        assert!(BookingStatus::Completed.blocks_slot());
        assert!(!BookingStatus::Pending.blocks_slot());
        assert!(!BookingStatus::Cancelled.blocks_slot());
    }

    #[test]
    fn test_status_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn test_booking_request_uses_website_payload_names() {
        let json = serde_json::json!({
            "organizationName": "Tech Corp Ghana",
            "contactPerson": "Kofi Mensah",
            "email": "kofi@techcorp.gh",
            "phone": "+233 24 123 4567",
            "eventDate": "2030-03-14",
            "startTime": "09:00",
            "endTime": "13:00",
            "attendeeCount": 30,
            "eventType": "Corporate Meeting",
            "cateringNeeded": true,
            "equipmentNeeded": ["HD Projector", "Sound System", "HD Projector"]
        });

        let request: BookingRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.event_type, EventType::CorporateMeeting);
        assert_eq!(request.equipment_needed.len(), 2);
        assert_eq!(request.package_type, PackageType::Hourly);
        assert!(request.special_requests.is_none());
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for e in Equipment::CATALOG {
            assert_eq!(e.label().parse::<Equipment>().unwrap(), e);
        }
        assert_eq!("Workshop/Training".parse::<EventType>().unwrap(), EventType::WorkshopTraining);
        assert!("Wedding".parse::<EventType>().is_err());
    }
}
