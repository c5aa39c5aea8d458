//! Field validation for conference booking input.
//!
//! Shared by the booking wizard's step guards and the booking API so both
//! enforce the same rules.

use chrono::NaiveDate;
use serde::Serialize;
use validator::ValidateEmail;

use super::availability::Slot;
use super::calculators::{checked_duration, BookedDuration, ScheduleError};
use super::models::{BookingRequest, EventType, PricingRules};

/// A single unmet field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Phone numbers may contain digits, spaces, `+`, `-` and parentheses
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    phone.chars().any(|c| c.is_ascii_digit())
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str, label: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
        false
    } else {
        true
    }
}

/// Event details fields checked by the first wizard step
#[derive(Debug, Clone, Copy)]
pub struct DetailsInput<'a> {
    pub organization_name: &'a str,
    pub contact_person: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub event_type: Option<EventType>,
    pub attendee_count: u32,
}

/// Check event details; returns every unmet constraint
pub fn check_details(rules: &PricingRules, input: &DetailsInput<'_>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    require(&mut errors, "organizationName", input.organization_name, "Organization name");
    require(&mut errors, "contactPerson", input.contact_person, "Contact person");

    if require(&mut errors, "email", input.email, "Email") && !input.email.trim().validate_email() {
        errors.push(FieldError::new("email", "Invalid email address"));
    }

    if require(&mut errors, "phone", input.phone, "Phone") && !is_valid_phone(input.phone) {
        errors.push(FieldError::new("phone", "Invalid phone number"));
    }

    if input.event_type.is_none() {
        errors.push(FieldError::new("eventType", "Event type is required"));
    }

    if input.attendee_count < 1 || input.attendee_count > rules.capacity {
        errors.push(FieldError::new(
            "attendeeCount",
            format!("Attendee count must be between 1 and {}", rules.capacity),
        ));
    }

    errors
}

fn schedule_error_field(err: &ScheduleError) -> &'static str {
    match err {
        ScheduleError::EndNotAfterStart { .. } => "endTime",
        _ => "startTime",
    }
}

/// Check the schedule; returns the booked duration when every guard passes
pub fn check_schedule(
    event_date: Option<NaiveDate>,
    start_time: &str,
    end_time: &str,
    today: NaiveDate,
) -> Result<BookedDuration, Vec<FieldError>> {
    let mut errors = Vec::new();

    match event_date {
        None => errors.push(FieldError::new("eventDate", "Event date is required")),
        Some(date) if date < today => {
            errors.push(FieldError::new("eventDate", "Event date must be today or in the future"))
        }
        Some(_) => {}
    }

    let has_start = require(&mut errors, "startTime", start_time, "Start time");
    let has_end = require(&mut errors, "endTime", end_time, "End time");

    let duration = if has_start && has_end {
        match checked_duration(start_time, end_time) {
            Ok(duration) => Some(duration),
            Err(err) => {
                errors.push(FieldError::new(schedule_error_field(&err), err.to_string()));
                None
            }
        }
    } else {
        None
    };

    match duration {
        Some(duration) if errors.is_empty() => Ok(duration),
        _ => Err(errors),
    }
}

/// A booking request that passed every field check
#[derive(Debug, Clone, Copy)]
pub struct ValidatedSchedule {
    pub slot: Slot,
    pub duration: BookedDuration,
}

/// Validate a complete request as the API receives it
pub fn validate_request(
    rules: &PricingRules,
    request: &BookingRequest,
    today: NaiveDate,
) -> Result<ValidatedSchedule, Vec<FieldError>> {
    let mut errors = check_details(
        rules,
        &DetailsInput {
            organization_name: &request.organization_name,
            contact_person: &request.contact_person,
            email: &request.email,
            phone: &request.phone,
            event_type: Some(request.event_type),
            attendee_count: request.attendee_count,
        },
    );

    let schedule = check_schedule(Some(request.event_date), &request.start_time, &request.end_time, today);

    match schedule {
        Ok(duration) if errors.is_empty() => {
            let slot = Slot::parse(request.event_date, &request.start_time, &request.end_time)
                .map_err(|e| vec![FieldError::new(schedule_error_field(&e), e.to_string())])?;
            Ok(ValidatedSchedule { slot, duration })
        }
        Ok(_) => Err(errors),
        Err(schedule_errors) => {
            errors.extend(schedule_errors);
            Err(errors)
        }
    }
}
