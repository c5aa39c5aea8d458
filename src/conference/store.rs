//! Persistence collaborator for conference bookings.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

use super::availability::{conflicts_with, ExistingBooking, Slot};
use super::calculators::parse_time_of_day;
use super::models::{BookingUpdate, ConferenceBooking, NewConferenceBooking};

#[async_trait]
pub trait ConferenceBookingStore: Send + Sync {
    /// All bookings (any status) on a date
    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<ExistingBooking>, StoreError>;

    /// Persist a new booking.
    ///
    /// Implementations re-check the slot against blocking bookings and
    /// return `StoreError::SlotTaken` when it is held.
    async fn create(&self, booking: NewConferenceBooking) -> Result<ConferenceBooking, StoreError>;

    /// Bookings ordered by date then start time, optionally for one contact email
    async fn list(&self, contact_email: Option<&str>) -> Result<Vec<ConferenceBooking>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ConferenceBooking>, StoreError>;

    /// Apply an admin edit atomically.
    ///
    /// A status change is refused with `StoreError::StatusChanged` unless the
    /// booking is still in the expected status, and moving into a blocking
    /// status re-checks the slot.
    async fn update(&self, id: Uuid, update: &BookingUpdate) -> Result<ConferenceBooking, StoreError>;
}

/// Slot of an already persisted booking
pub(crate) fn slot_of(booking: &ConferenceBooking) -> Result<Slot, StoreError> {
    let start = parse_time_of_day(&booking.request.start_time)
        .map_err(|e| StoreError::Corrupt(format!("booking {}: {}", booking.id, e)))?;
    let end = parse_time_of_day(&booking.request.end_time)
        .map_err(|e| StoreError::Corrupt(format!("booking {}: {}", booking.id, e)))?;
    Ok(Slot {
        date: booking.request.event_date,
        start,
        end,
    })
}

fn existing_of(booking: &ConferenceBooking) -> Result<ExistingBooking, StoreError> {
    let slot = slot_of(booking)?;
    Ok(ExistingBooking {
        booking_id: booking.id,
        date: slot.date,
        start: slot.start,
        end: slot.end,
        status: booking.status,
    })
}

/// Process-local booking store, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryConferenceBookingStore {
    bookings: RwLock<Vec<ConferenceBooking>>,
}

impl InMemoryConferenceBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot_is_held(bookings: &[ConferenceBooking], candidate: &Slot, ignore: Option<Uuid>) -> Result<bool, StoreError> {
    for booking in bookings.iter().filter(|b| Some(b.id) != ignore) {
        if conflicts_with(candidate, &existing_of(booking)?) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[async_trait]
impl ConferenceBookingStore for InMemoryConferenceBookingStore {
    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<ExistingBooking>, StoreError> {
        let bookings = self.bookings.read().await;
        bookings
            .iter()
            .filter(|b| b.request.event_date == date)
            .map(existing_of)
            .collect()
    }

    async fn create(&self, booking: NewConferenceBooking) -> Result<ConferenceBooking, StoreError> {
        let mut bookings = self.bookings.write().await;

        let candidate = Slot {
            date: booking.request.event_date,
            start: booking.start,
            end: booking.end,
        };
        if slot_is_held(&bookings, &candidate, None)? {
            return Err(StoreError::SlotTaken);
        }

        let record = ConferenceBooking {
            id: Uuid::new_v4(),
            booking_reference: booking.booking_reference,
            request: booking.request,
            quote: booking.quote,
            status: booking.status,
            created_at: booking.created_at,
            updated_at: booking.created_at,
        };
        bookings.push(record.clone());
        Ok(record)
    }

    async fn list(&self, contact_email: Option<&str>) -> Result<Vec<ConferenceBooking>, StoreError> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<ConferenceBooking> = bookings
            .iter()
            .filter(|b| contact_email.map_or(true, |email| b.request.email.eq_ignore_ascii_case(email)))
            .cloned()
            .collect();

        let mut keyed = Vec::with_capacity(matching.len());
        for booking in matching.drain(..) {
            let slot = slot_of(&booking)?;
            keyed.push(((slot.date, slot.start), booking));
        }
        keyed.sort_by_key(|(key, _)| *key);
        Ok(keyed.into_iter().map(|(_, booking)| booking).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ConferenceBooking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn update(&self, id: Uuid, update: &BookingUpdate) -> Result<ConferenceBooking, StoreError> {
        let mut bookings = self.bookings.write().await;

        let index = bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(change) = update.status {
            let actual = bookings[index].status;
            if actual != change.from {
                return Err(StoreError::StatusChanged { actual });
            }
            if change.to.blocks_slot() {
                let candidate = slot_of(&bookings[index])?;
                if slot_is_held(&bookings, &candidate, Some(id))? {
                    return Err(StoreError::SlotTaken);
                }
            }
        }

        let booking = &mut bookings[index];
        if let Some(change) = update.status {
            booking.status = change.to;
        }
        if let Some(special_requests) = &update.special_requests {
            booking.request.special_requests = special_requests.clone();
        }
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::conference::calculators::{compute_quote, BookedDuration, QuoteInput};
    use crate::conference::models::{BookingRequest, BookingStatus, EventType, PackageType, PricingRules, StatusChange};

    pub(crate) fn request_on(date: NaiveDate, start: &str, end: &str, email: &str) -> BookingRequest {
        BookingRequest {
            organization_name: "Tech Corp Ghana".to_string(),
            contact_person: "Kofi Mensah".to_string(),
            email: email.to_string(),
            phone: "+233 24 123 4567".to_string(),
            event_date: date,
            start_time: start.to_string(),
            end_time: end.to_string(),
            attendee_count: 30,
            event_type: EventType::Conference,
            catering_needed: false,
            equipment_needed: BTreeSet::new(),
            special_requests: None,
            package_type: PackageType::Hourly,
        }
    }

    fn new_booking(date: NaiveDate, start: &str, end: &str, status: BookingStatus) -> NewConferenceBooking {
        let request = request_on(date, start, end, "kofi@techcorp.gh");
        let slot = Slot::parse(date, start, end).unwrap();
        let quote = compute_quote(
            &PricingRules::default(),
            &QuoteInput {
                duration: BookedDuration::between(slot.start, slot.end),
                attendee_count: request.attendee_count,
                catering_needed: false,
                equipment_count: 0,
                package_type: PackageType::Hourly,
            },
        );
        NewConferenceBooking {
            booking_reference: "CONF123456ABCDEF".to_string(),
            request,
            start: slot.start,
            end: slot.end,
            quote,
            status,
            created_at: Utc::now(),
        }
    }

    fn move_status(from: BookingStatus, to: BookingStatus) -> BookingUpdate {
        BookingUpdate {
            status: Some(StatusChange { from, to }),
            special_requests: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_slot_held_by_confirmed_booking() {
        let store = InMemoryConferenceBookingStore::new();
        store
            .create(new_booking(day(1), "10:00", "12:00", BookingStatus::Confirmed))
            .await
            .unwrap();

        let err = store
            .create(new_booking(day(1), "11:00", "13:00", BookingStatus::Pending))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotTaken));

        // touching the boundary is fine
        store
            .create(new_booking(day(1), "12:00", "13:00", BookingStatus::Pending))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_confirming_into_held_slot_fails() {
        let store = InMemoryConferenceBookingStore::new();
        let first = store
            .create(new_booking(day(2), "10:00", "12:00", BookingStatus::Pending))
            .await
            .unwrap();
        let second = store
            .create(new_booking(day(2), "11:00", "12:00", BookingStatus::Pending))
            .await
            .unwrap();

        let confirm = move_status(BookingStatus::Pending, BookingStatus::Confirmed);
        store.update(first.id, &confirm).await.unwrap();
        let err = store.update(second.id, &confirm).await.unwrap_err();
        assert!(matches!(err, StoreError::SlotTaken));

        // completing the holder does not conflict with itself
        let completed = store
            .update(first.id, &move_status(BookingStatus::Confirmed, BookingStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let store = InMemoryConferenceBookingStore::new();
        store.create(new_booking(day(5), "14:00", "15:00", BookingStatus::Pending)).await.unwrap();
        store.create(new_booking(day(3), "09:00", "10:00", BookingStatus::Pending)).await.unwrap();
        store.create(new_booking(day(5), "08:00", "09:00", BookingStatus::Pending)).await.unwrap();

        let all = store.list(None).await.unwrap();
        let order: Vec<(NaiveDate, String)> = all
            .iter()
            .map(|b| (b.request.event_date, b.request.start_time.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                (day(3), "09:00".to_string()),
                (day(5), "08:00".to_string()),
                (day(5), "14:00".to_string()),
            ]
        );

        assert_eq!(store.list(Some("KOFI@techcorp.gh")).await.unwrap().len(), 3);
        assert!(store.list(Some("ama@example.com")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_booking() {
        let store = InMemoryConferenceBookingStore::new();
        let err = store
            .update(Uuid::new_v4(), &move_status(BookingStatus::Pending, BookingStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_status_change_requires_expected_status() {
        let store = InMemoryConferenceBookingStore::new();
        let booking = store
            .create(new_booking(day(7), "10:00", "12:00", BookingStatus::Pending))
            .await
            .unwrap();
        store
            .update(booking.id, &move_status(BookingStatus::Pending, BookingStatus::Cancelled))
            .await
            .unwrap();

        // a writer still holding the pending snapshot loses
        let err = store
            .update(booking.id, &move_status(BookingStatus::Pending, BookingStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StatusChanged {
                actual: BookingStatus::Cancelled
            }
        ));
        let stored = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_special_requests_update_leaves_status_alone() {
        let store = InMemoryConferenceBookingStore::new();
        let booking = store
            .create(new_booking(day(8), "10:00", "12:00", BookingStatus::Pending))
            .await
            .unwrap();

        let updated = store
            .update(
                booking.id,
                &BookingUpdate {
                    status: None,
                    special_requests: Some(Some("Vegetarian lunch".to_string())),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Pending);
        assert_eq!(updated.request.special_requests.as_deref(), Some("Vegetarian lunch"));

        let cleared = store
            .update(
                booking.id,
                &BookingUpdate {
                    status: None,
                    special_requests: Some(None),
                },
            )
            .await
            .unwrap();
        assert!(cleared.request.special_requests.is_none());
    }
}
