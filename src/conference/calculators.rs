//! Core conference pricing functions.
//!
//! Pure functions for duration and quote math - no database access.
//! Cheap enough to run on every form change.

use chrono::NaiveTime;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use super::models::{PackageType, PricingRules, Quote};

const MINUTES_PER_HOUR: i64 = 60;
const HALF_DAY_HOURS: i64 = 4;
const HOURS_PER_BOOKING_DAY: i64 = 8;

/// Round a money amount to `places` decimals, ties going to the even digit.
///
/// Every quote line and every converted price goes through this so totals
/// add up the same way on each call.
///
/// ```
/// use rust_decimal_macros::dec;
/// use wgh_booking::conference::round_money;
///
/// assert_eq!(round_money(dec!(112.125), 2), dec!(112.12));
/// assert_eq!(round_money(dec!(112.135), 2), dec!(112.14));
/// assert_eq!(round_money(dec!(1.5), 0), dec!(2));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Problems with a start/end time pair
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Time of day is required")]
    Missing,

    #[error("Invalid time format '{0}' (expected HH:MM)")]
    InvalidTime(String),

    /// Covers equal times and overnight ranges, which are not supported
    #[error("End time {end} must be after start time {start} on the same day")]
    EndNotAfterStart { start: String, end: String },
}

/// Parse a 24-hour `HH:MM` (or `H:MM`) time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ScheduleError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ScheduleError::Missing);
    }

    let invalid = || ScheduleError::InvalidTime(value.to_string());
    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return Err(invalid());
    }

    let hour: u32 = hours.parse().map_err(|_| invalid())?;
    let minute: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Elapsed booking time, kept in whole minutes so money math stays exact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BookedDuration {
    minutes: i64,
}

impl BookedDuration {
    pub const ZERO: BookedDuration = BookedDuration { minutes: 0 };

    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes: minutes.max(0),
        }
    }

    /// Duration between two times of day; zero unless `end` is after `start`
    pub fn between(start: NaiveTime, end: NaiveTime) -> Self {
        Self::from_minutes((end - start).num_minutes())
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// Fractional hours, e.g. 90 minutes is 1.5
    pub fn hours(&self) -> Decimal {
        Decimal::from(self.minutes) / Decimal::from(MINUTES_PER_HOUR)
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0
    }
}

/// Parse a same-day `HH:MM` range, rejecting missing, malformed, equal and
/// overnight ranges.
pub fn parse_time_range(start: &str, end: &str) -> Result<(NaiveTime, NaiveTime), ScheduleError> {
    let start_time = parse_time_of_day(start)?;
    let end_time = parse_time_of_day(end)?;

    if end_time <= start_time {
        return Err(ScheduleError::EndNotAfterStart {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        });
    }

    Ok((start_time, end_time))
}

/// Duration between two `HH:MM` strings; see [`parse_time_range`]
pub fn checked_duration(start: &str, end: &str) -> Result<BookedDuration, ScheduleError> {
    let (start_time, end_time) = parse_time_range(start, end)?;
    Ok(BookedDuration::between(start_time, end_time))
}

/// Hours between two `HH:MM` strings, clamped to zero.
///
/// Zero means the schedule is incomplete or invalid, never a free booking.
pub fn calculate_hours(start: &str, end: &str) -> Decimal {
    checked_duration(start, end)
        .map(|d| d.hours())
        .unwrap_or(Decimal::ZERO)
}

/// Everything the quote engine needs from a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteInput {
    pub duration: BookedDuration,
    pub attendee_count: u32,
    pub catering_needed: bool,
    pub equipment_count: usize,
    pub package_type: PackageType,
}

/// Room portion of a quote for the chosen package
fn room_cost(rules: &PricingRules, duration: BookedDuration, package: PackageType) -> Decimal {
    match package {
        PackageType::Hourly => {
            Decimal::from(duration.minutes()) * rules.hourly_rate / Decimal::from(MINUTES_PER_HOUR)
        }
        PackageType::HalfDay => rules.hourly_rate * Decimal::from(HALF_DAY_HOURS),
        PackageType::FullDay => rules.daily_rate,
        PackageType::MultiDay => {
            let day_minutes = HOURS_PER_BOOKING_DAY * MINUTES_PER_HOUR;
            let days = (duration.minutes() + day_minutes - 1) / day_minutes;
            rules.daily_rate * Decimal::from(days)
        }
    }
}

/// Compute an itemized quote.
///
/// Each line is rounded to minor units before summing, so
/// `total == room_cost + catering_cost + equipment_cost` holds exactly.
pub fn compute_quote(rules: &PricingRules, input: &QuoteInput) -> Quote {
    let room_cost = round_money(room_cost(rules, input.duration, input.package_type), 2);

    let catering_cost = if input.catering_needed {
        round_money(Decimal::from(input.attendee_count) * rules.catering_rate, 2)
    } else {
        Decimal::ZERO
    };

    let equipment_count = u64::try_from(input.equipment_count).unwrap_or(u64::MAX);
    let equipment_cost = round_money(Decimal::from(equipment_count) * rules.equipment_rate, 2);

    Quote {
        duration_hours: round_money(input.duration.hours(), 2),
        room_cost,
        catering_cost,
        equipment_cost,
        total: room_cost + catering_cost + equipment_cost,
        currency: rules.currency.clone(),
        package_type: input.package_type,
    }
}
