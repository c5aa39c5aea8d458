//! Conference booking service functions with store access.
//!
//! These functions run validation and pricing, consult the booking store
//! and keep the availability cache in step with it.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::codes::booking_reference;
use crate::error::StoreError;

use super::availability::{find_conflicts, ExistingBooking, Slot};
use super::calculators::{checked_duration, compute_quote, BookedDuration, QuoteInput, ScheduleError};
use super::models::{
    BookingRequest, BookingStatus, BookingUpdate, ConferenceBooking, NewConferenceBooking, PricingRules, Quote,
    StatusChange,
};
use super::store::ConferenceBookingStore;
use super::validation::{validate_request, FieldError};

const BOOKING_REFERENCE_PREFIX: &str = "CONF";

/// Conference booking error types
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking details are incomplete or invalid")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("The conference room is not available on {date} from {start} to {end}")]
    SlotUnavailable {
        date: NaiveDate,
        start: String,
        end: String,
    },

    /// The pre-filter passed but the store's authoritative check did not
    #[error("The selected time slot is no longer available")]
    SlotNoLongerAvailable,

    #[error("Conference booking {0} not found")]
    NotFound(Uuid),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Booking could not be saved: {0}")]
    Persistence(StoreError),
}

impl BookingError {
    fn slot_unavailable(slot: &Slot) -> Self {
        BookingError::SlotUnavailable {
            date: slot.date,
            start: slot.start.format("%H:%M").to_string(),
            end: slot.end.format("%H:%M").to_string(),
        }
    }
}

/// Blocking bookings for a date, plus the verdict for a requested window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub date: NaiveDate,
    /// Only present when a start and end time were supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    pub booked_slots: Vec<ExistingBooking>,
}

/// Conference booking service shared by the HTTP routes and the wizard
pub struct ConferenceService {
    store: Arc<dyn ConferenceBookingStore>,
    rules: PricingRules,
    cache: AppCache,
}

impl ConferenceService {
    pub fn new(store: Arc<dyn ConferenceBookingStore>, rules: PricingRules, cache: AppCache) -> Self {
        Self { store, rules, cache }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    pub fn cache(&self) -> &AppCache {
        &self.cache
    }

    pub fn quote(&self, input: &QuoteInput) -> Quote {
        compute_quote(&self.rules, input)
    }

    /// Quote for a full request; an invalid schedule prices the room at zero
    pub fn quote_request(&self, request: &BookingRequest) -> Quote {
        self.quote(&QuoteInput {
            duration: checked_duration(&request.start_time, &request.end_time).unwrap_or(BookedDuration::ZERO),
            attendee_count: request.attendee_count,
            catering_needed: request.catering_needed,
            equipment_count: request.equipment_needed.len(),
            package_type: request.package_type,
        })
    }

    /// Advisory availability lookup for a date, served from cache when warm
    pub async fn availability(&self, date: NaiveDate, window: Option<Slot>) -> Result<AvailabilityReport, BookingError> {
        let slots = match self.cache.day_slots.get(&date).await {
            Some(cached) => {
                debug!("Cache HIT for availability: {}", date);
                cached
            }
            None => {
                debug!("Cache MISS for availability: {}", date);
                let blocking: Vec<ExistingBooking> = self
                    .store
                    .bookings_on(date)
                    .await
                    .map_err(BookingError::Persistence)?
                    .into_iter()
                    .filter(|b| b.status.blocks_slot())
                    .collect();
                let blocking = Arc::new(blocking);
                self.cache.day_slots.insert(date, blocking.clone()).await;
                blocking
            }
        };

        let is_available = window.map(|slot| find_conflicts(&slot, &slots).is_empty());

        Ok(AvailabilityReport {
            date,
            is_available,
            booked_slots: (*slots).clone(),
        })
    }

    /// Validate, price and persist a booking request as `pending`.
    ///
    /// The slot is checked against the store's current bookings before the
    /// write, and the store repeats that check atomically with the insert.
    pub async fn submit_booking(&self, request: BookingRequest, today: NaiveDate) -> Result<ConferenceBooking, BookingError> {
        let validated = validate_request(&self.rules, &request, today).map_err(BookingError::Validation)?;
        let slot = validated.slot;

        let quote = compute_quote(
            &self.rules,
            &QuoteInput {
                duration: validated.duration,
                attendee_count: request.attendee_count,
                catering_needed: request.catering_needed,
                equipment_count: request.equipment_needed.len(),
                package_type: request.package_type,
            },
        );

        let existing = self.store.bookings_on(slot.date).await.map_err(|e| {
            error!("Failed to load bookings for {}: {}", slot.date, e);
            BookingError::Persistence(e)
        })?;
        let conflicts = find_conflicts(&slot, &existing);
        if !conflicts.is_empty() {
            warn!(
                date = %slot.date,
                conflicts = conflicts.len(),
                "Rejected conference booking for an occupied slot"
            );
            return Err(BookingError::slot_unavailable(&slot));
        }

        let now = Utc::now();
        let new_booking = NewConferenceBooking {
            booking_reference: booking_reference(BOOKING_REFERENCE_PREFIX, now),
            request,
            start: slot.start,
            end: slot.end,
            quote,
            status: BookingStatus::Pending,
            created_at: now,
        };

        match self.store.create(new_booking).await {
            Ok(booking) => {
                self.cache.invalidate_day(slot.date).await;
                info!(
                    reference = %booking.booking_reference,
                    date = %slot.date,
                    total = %booking.quote.total,
                    "Conference booking submitted"
                );
                Ok(booking)
            }
            Err(StoreError::SlotTaken) => {
                warn!(date = %slot.date, "Conference slot taken by a concurrent booking");
                Err(BookingError::SlotNoLongerAvailable)
            }
            Err(e) => {
                error!("Failed to persist conference booking: {}", e);
                Err(BookingError::Persistence(e))
            }
        }
    }

    pub async fn list_bookings(&self, contact_email: Option<&str>) -> Result<Vec<ConferenceBooking>, BookingError> {
        self.store
            .list(contact_email)
            .await
            .map_err(BookingError::Persistence)
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<ConferenceBooking, BookingError> {
        self.store
            .get(id)
            .await
            .map_err(BookingError::Persistence)?
            .ok_or(BookingError::NotFound(id))
    }

    /// Move a booking through its lifecycle.
    ///
    /// Confirming or completing re-checks the slot against other blocking
    /// bookings; cancelled and completed bookings are final.
    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<ConferenceBooking, BookingError> {
        self.update_booking(id, Some(status), None).await
    }

    /// Admin edit: a status move, new special requests, or both.
    ///
    /// The transition is checked against the stored status and the store
    /// only applies it if that status is still current. Blank special
    /// requests clear them.
    pub async fn update_booking(
        &self,
        id: Uuid,
        status: Option<BookingStatus>,
        special_requests: Option<String>,
    ) -> Result<ConferenceBooking, BookingError> {
        if status.is_none() && special_requests.is_none() {
            return Err(BookingError::Validation(vec![FieldError::new(
                "status",
                "Nothing to update: give a status or specialRequests",
            )]));
        }

        let current = self.get_booking(id).await?;

        let change = match status {
            Some(to) if !current.status.can_transition_to(to) => {
                return Err(BookingError::InvalidTransition {
                    from: current.status.to_string(),
                    to: to.to_string(),
                });
            }
            Some(to) => Some(StatusChange {
                from: current.status,
                to,
            }),
            None => None,
        };
        let update = BookingUpdate {
            status: change,
            special_requests: special_requests.map(|text| {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }),
        };

        match self.store.update(id, &update).await {
            Ok(updated) => {
                if let Some(change) = change {
                    self.cache.invalidate_day(updated.request.event_date).await;
                    info!(
                        reference = %updated.booking_reference,
                        from = %change.from,
                        to = %change.to,
                        "Conference booking status changed"
                    );
                } else {
                    debug!(reference = %updated.booking_reference, "Conference booking special requests updated");
                }
                Ok(updated)
            }
            Err(StoreError::StatusChanged { actual }) => {
                warn!(
                    reference = %current.booking_reference,
                    expected = %current.status,
                    actual = %actual,
                    "Conference booking status changed concurrently"
                );
                Err(BookingError::InvalidTransition {
                    from: actual.to_string(),
                    to: change.map_or(actual, |c| c.to).to_string(),
                })
            }
            Err(StoreError::SlotTaken) => {
                let slot = super::store::slot_of(&current).map_err(BookingError::Persistence)?;
                warn!(reference = %current.booking_reference, "Cannot confirm booking into an occupied slot");
                Err(BookingError::slot_unavailable(&slot))
            }
            Err(StoreError::NotFound) => Err(BookingError::NotFound(id)),
            Err(e) => {
                error!("Failed to update conference booking {}: {}", id, e);
                Err(BookingError::Persistence(e))
            }
        }
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ConferenceBooking, BookingError> {
        self.update_status(id, BookingStatus::Cancelled).await
    }
}
