//! Conference room availability checks.
//!
//! Half-open interval overlap against bookings that hold the room. These
//! checks are an optimistic pre-filter; stores repeat them authoritatively.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use super::calculators::{parse_time_range, ScheduleError};
use super::models::BookingStatus;

/// A (date, start, end) reservation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    /// Build a slot from `HH:MM` strings, rejecting empty or inverted ranges
    pub fn parse(date: NaiveDate, start: &str, end: &str) -> Result<Self, ScheduleError> {
        let (start, end) = parse_time_range(start, end)?;
        Ok(Self { date, start, end })
    }
}

/// An existing reservation as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingBooking {
    pub booking_id: Uuid,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_time_of_day")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_time_of_day")]
    pub end: NaiveTime,
    pub status: BookingStatus,
}

fn serialize_time_of_day<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.format("%H:%M").to_string())
}

/// Half-open overlap: touching boundaries do not overlap
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether `existing` holds the room during any part of `candidate`
pub fn conflicts_with(candidate: &Slot, existing: &ExistingBooking) -> bool {
    existing.status.blocks_slot()
        && existing.date == candidate.date
        && overlaps(candidate.start, candidate.end, existing.start, existing.end)
}

/// All blocking bookings that overlap the candidate slot
pub fn find_conflicts<'a>(candidate: &Slot, existing: &'a [ExistingBooking]) -> Vec<&'a ExistingBooking> {
    existing
        .iter()
        .filter(|booking| conflicts_with(candidate, booking))
        .collect()
}

/// True when no confirmed or completed booking overlaps the candidate slot
pub fn is_available(candidate: &Slot, existing: &[ExistingBooking]) -> bool {
    !existing.iter().any(|booking| conflicts_with(candidate, booking))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 5, 20).unwrap()
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot::parse(date(), start, end).unwrap()
    }

    fn existing(start: &str, end: &str, status: BookingStatus) -> ExistingBooking {
        let s = slot(start, end);
        ExistingBooking {
            booking_id: Uuid::new_v4(),
            date: s.date,
            start: s.start,
            end: s.end,
            status,
        }
    }

    #[test]
    fn test_slot_parse_rejects_what_duration_rejects() {
        use crate::conference::calculators::checked_duration;

        for (start, end) in [("10:00", "10:00"), ("22:00", "02:00"), ("9", "10:00"), ("", "10:00")] {
            assert_eq!(
                Slot::parse(date(), start, end).unwrap_err(),
                checked_duration(start, end).unwrap_err()
            );
        }
        assert_eq!(slot(" 9:30", "11:00").start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_touching_boundaries_do_not_conflict() {
        let booked = vec![existing("12:00", "14:00", BookingStatus::Confirmed)];
        assert!(is_available(&slot("10:00", "12:00"), &booked));
        assert!(is_available(&slot("14:00", "16:00"), &booked));
    }

    #[test]
    fn test_partial_overlap_conflicts() {
        let booked = vec![existing("12:00", "14:00", BookingStatus::Confirmed)];
        assert!(!is_available(&slot("10:00", "12:30"), &booked));
        assert!(!is_available(&slot("13:59", "18:00"), &booked));
    }

    #[test]
    fn test_containment_conflicts_both_ways() {
        let booked = vec![existing("09:00", "17:00", BookingStatus::Completed)];
        assert!(!is_available(&slot("10:00", "11:00"), &booked));

        let booked = vec![existing("10:00", "11:00", BookingStatus::Confirmed)];
        assert!(!is_available(&slot("09:00", "17:00"), &booked));
    }

    #[test]
    fn test_pending_and_cancelled_never_block() {
        let booked = vec![
            existing("10:00", "12:00", BookingStatus::Pending),
            existing("10:00", "12:00", BookingStatus::Cancelled),
        ];
        assert!(is_available(&slot("10:00", "12:00"), &booked));
    }

    #[test]
    fn test_other_dates_never_block() {
        let mut other_day = existing("10:00", "12:00", BookingStatus::Confirmed);
        other_day.date = date().succ_opt().unwrap();
        assert!(is_available(&slot("10:00", "12:00"), &[other_day]));
    }

    #[test]
    fn test_find_conflicts_returns_only_blocking_overlaps() {
        let booked = vec![
            existing("08:00", "09:00", BookingStatus::Confirmed),
            existing("09:30", "10:30", BookingStatus::Confirmed),
            existing("10:00", "11:00", BookingStatus::Pending),
            existing("10:45", "12:00", BookingStatus::Completed),
        ];
        let conflicts = find_conflicts(&slot("09:00", "11:00"), &booked);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].booking_id, booked[1].booking_id);
        assert_eq!(conflicts[1].booking_id, booked[3].booking_id);
    }

    #[test]
    fn test_slot_parse_rejects_inverted_range() {
        assert!(Slot::parse(date(), "12:00", "12:00").is_err());
        assert!(Slot::parse(date(), "", "12:00").is_err());
    }
}
