//! Three-step conference booking wizard.
//!
//! Details → Schedule → Review → Confirmation. Each forward move runs the
//! exit guard of the current step and stays put when it fails. Moving back
//! never clears a field.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::calculators::{checked_duration, compute_quote, BookedDuration, QuoteInput};
use super::models::{BookingRequest, ConferenceBooking, Equipment, EventType, PackageType, PricingRules, Quote};
use super::services::{BookingError, ConferenceService};
use super::validation::{check_details, check_schedule, DetailsInput, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Details,
    Schedule,
    Review,
    Confirmation,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WizardStep::Details => "details",
            WizardStep::Schedule => "schedule",
            WizardStep::Review => "review",
            WizardStep::Confirmation => "confirmation",
        })
    }
}

/// What the wizard does when the booking store fails on submit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPolicy {
    /// Stay on Review with the draft intact so the guest can retry
    #[default]
    Strict,
    /// Show an unconfirmed confirmation and follow up by phone
    Optimistic,
}

impl FromStr for SubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(SubmissionPolicy::Strict),
            "optimistic" => Ok(SubmissionPolicy::Optimistic),
            other => Err(format!("unknown submission policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    /// Stored as a pending booking
    Submitted,
    /// Store failed; the hotel has to follow up
    Unconfirmed,
}

/// Terminal screen contents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub status: ConfirmationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<ConferenceBooking>,
    pub quote: Quote,
    pub support_phone: String,
}

/// Submission policy plus the contact shown on every confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub policy: SubmissionPolicy,
    pub support_phone: String,
}

impl SubmissionSettings {
    pub fn new(policy: SubmissionPolicy, support_phone: impl Into<String>) -> Self {
        Self {
            policy,
            support_phone: support_phone.into(),
        }
    }

    /// Submit a request through the booking service and build the confirmation.
    ///
    /// Validation errors and slot conflicts are always returned. Store
    /// failures are too unless the policy is optimistic.
    pub async fn submit(
        &self,
        service: &ConferenceService,
        request: BookingRequest,
        today: NaiveDate,
    ) -> Result<Confirmation, BookingError> {
        let quote = service.quote_request(&request);
        match service.submit_booking(request, today).await {
            Ok(booking) => Ok(Confirmation {
                status: ConfirmationStatus::Submitted,
                quote: booking.quote.clone(),
                booking: Some(booking),
                support_phone: self.support_phone.clone(),
            }),
            Err(BookingError::Persistence(e)) if self.policy == SubmissionPolicy::Optimistic => {
                warn!("Booking not stored, showing unconfirmed confirmation: {}", e);
                Ok(Confirmation {
                    status: ConfirmationStatus::Unconfirmed,
                    booking: None,
                    quote,
                    support_phone: self.support_phone.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Booking fields as entered so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub organization_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub event_type: Option<EventType>,
    pub attendee_count: u32,
    pub event_date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub catering_needed: bool,
    pub equipment_needed: BTreeSet<Equipment>,
    pub special_requests: String,
    pub package_type: PackageType,
}

impl BookingDraft {
    fn details(&self) -> DetailsInput<'_> {
        DetailsInput {
            organization_name: &self.organization_name,
            contact_person: &self.contact_person,
            email: &self.email,
            phone: &self.phone,
            event_type: self.event_type,
            attendee_count: self.attendee_count,
        }
    }

    fn to_request(&self) -> Result<BookingRequest, BookingError> {
        let mut missing = Vec::new();
        if self.event_type.is_none() {
            missing.push(FieldError::new("eventType", "Event type is required"));
        }
        if self.event_date.is_none() {
            missing.push(FieldError::new("eventDate", "Event date is required"));
        }
        let (Some(event_type), Some(event_date)) = (self.event_type, self.event_date) else {
            return Err(BookingError::Validation(missing));
        };

        let special = self.special_requests.trim();
        Ok(BookingRequest {
            organization_name: self.organization_name.trim().to_string(),
            contact_person: self.contact_person.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            event_date,
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            attendee_count: self.attendee_count,
            event_type,
            catering_needed: self.catering_needed,
            equipment_needed: self.equipment_needed.clone(),
            special_requests: (!special.is_empty()).then(|| special.to_string()),
            package_type: self.package_type,
        })
    }
}

pub struct BookingWizard {
    rules: PricingRules,
    settings: SubmissionSettings,
    step: WizardStep,
    draft: BookingDraft,
    confirmation: Option<Confirmation>,
}

impl BookingWizard {
    pub fn new(rules: PricingRules, policy: SubmissionPolicy, support_phone: impl Into<String>) -> Self {
        Self {
            rules,
            settings: SubmissionSettings::new(policy, support_phone),
            step: WizardStep::Details,
            draft: BookingDraft::default(),
            confirmation: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Editable draft; `None` once the booking has been submitted
    pub fn draft_mut(&mut self) -> Option<&mut BookingDraft> {
        match self.step {
            WizardStep::Confirmation => None,
            _ => Some(&mut self.draft),
        }
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    /// Add or remove an equipment item; returns whether it is now selected
    pub fn toggle_equipment(&mut self, item: Equipment) -> bool {
        let Some(draft) = self.draft_mut() else {
            return false;
        };
        if !draft.equipment_needed.remove(&item) {
            draft.equipment_needed.insert(item);
            true
        } else {
            false
        }
    }

    /// Quote for the draft as it stands; an invalid schedule prices the room at zero
    pub fn quote(&self) -> Quote {
        let duration =
            checked_duration(&self.draft.start_time, &self.draft.end_time).unwrap_or(BookedDuration::ZERO);
        compute_quote(
            &self.rules,
            &QuoteInput {
                duration,
                attendee_count: self.draft.attendee_count,
                catering_needed: self.draft.catering_needed,
                equipment_count: self.draft.equipment_needed.len(),
                package_type: self.draft.package_type,
            },
        )
    }

    fn invalid_move(&self, to: &str) -> BookingError {
        BookingError::InvalidTransition {
            from: self.step.to_string(),
            to: to.to_string(),
        }
    }

    /// Run the current step's exit guard and advance when it passes
    pub fn next(&mut self, today: NaiveDate) -> Result<WizardStep, BookingError> {
        self.step = match self.step {
            WizardStep::Details => {
                let errors = check_details(&self.rules, &self.draft.details());
                if !errors.is_empty() {
                    return Err(BookingError::Validation(errors));
                }
                WizardStep::Schedule
            }
            WizardStep::Schedule => {
                check_schedule(self.draft.event_date, &self.draft.start_time, &self.draft.end_time, today)
                    .map_err(BookingError::Validation)?;
                WizardStep::Review
            }
            WizardStep::Review => return Err(self.invalid_move("confirmation")),
            WizardStep::Confirmation => return Err(self.invalid_move("details")),
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<WizardStep, BookingError> {
        self.step = match self.step {
            WizardStep::Schedule => WizardStep::Details,
            WizardStep::Review => WizardStep::Schedule,
            WizardStep::Details | WizardStep::Confirmation => return Err(self.invalid_move("previous step")),
        };
        Ok(self.step)
    }

    /// From Review, return to the schedule step keeping every field
    pub fn edit(&mut self) -> Result<WizardStep, BookingError> {
        if self.step != WizardStep::Review {
            return Err(self.invalid_move("schedule"));
        }
        self.step = WizardStep::Schedule;
        Ok(self.step)
    }

    /// Submit the reviewed draft; on error the wizard stays on Review
    pub async fn submit(&mut self, service: &ConferenceService, today: NaiveDate) -> Result<Confirmation, BookingError> {
        if self.step != WizardStep::Review {
            return Err(self.invalid_move("confirmation"));
        }

        let request = self.draft.to_request()?;
        let confirmation = self.settings.submit(service, request, today).await?;
        if let Some(booking) = &confirmation.booking {
            info!(reference = %booking.booking_reference, "Booking wizard completed");
        }

        self.step = WizardStep::Confirmation;
        self.confirmation = Some(confirmation.clone());
        Ok(confirmation)
    }

    /// Leave the confirmation screen and start over with an empty draft
    pub fn close(&mut self) -> Result<(), BookingError> {
        if self.step != WizardStep::Confirmation {
            return Err(self.invalid_move("details"));
        }
        self.step = WizardStep::Details;
        self.draft = BookingDraft::default();
        self.confirmation = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::cache::AppCache;
    use crate::conference::services::tests::{service, today, UnreachableStore};

    const SUPPORT_PHONE: &str = "+233245678900";

    fn wizard(policy: SubmissionPolicy) -> BookingWizard {
        BookingWizard::new(PricingRules::default(), policy, SUPPORT_PHONE)
    }

    fn fill_details(wizard: &mut BookingWizard) {
        let draft = wizard.draft_mut().unwrap();
        draft.organization_name = "Tech Corp Ghana".to_string();
        draft.contact_person = "Kofi Mensah".to_string();
        draft.email = "kofi@techcorp.gh".to_string();
        draft.phone = "+233 24 123 4567".to_string();
        draft.event_type = Some(EventType::CorporateMeeting);
        draft.attendee_count = 30;
    }

    fn fill_schedule(wizard: &mut BookingWizard, start: &str, end: &str) {
        let draft = wizard.draft_mut().unwrap();
        draft.event_date = NaiveDate::from_ymd_opt(2030, 3, 14);
        draft.start_time = start.to_string();
        draft.end_time = end.to_string();
    }

    fn at_review(policy: SubmissionPolicy) -> BookingWizard {
        let mut wizard = wizard(policy);
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();
        fill_schedule(&mut wizard, "09:00", "13:00");
        wizard.next(today()).unwrap();
        assert_eq!(wizard.step(), WizardStep::Review);
        wizard
    }

    // ===== Step guard tests =====

    #[test]
    fn test_details_guard_blocks_incomplete_draft() {
        let mut wizard = wizard(SubmissionPolicy::Strict);
        let err = wizard.next(today()).unwrap_err();
        assert!(matches!(err, BookingError::Validation(ref errors) if errors.len() == 6));
        assert_eq!(wizard.step(), WizardStep::Details);
    }

    #[test]
    fn test_equal_times_block_schedule_step() {
        let mut wizard = wizard(SubmissionPolicy::Strict);
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();
        fill_schedule(&mut wizard, "10:00", "10:00");

        assert_eq!(wizard.quote().duration_hours, dec!(0));
        let err = wizard.next(today()).unwrap_err();
        match err {
            BookingError::Validation(errors) => assert_eq!(errors[0].field, "endTime"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(wizard.step(), WizardStep::Schedule);
    }

    #[test]
    fn test_back_and_edit_preserve_fields() {
        let mut wizard = at_review(SubmissionPolicy::Strict);
        wizard.toggle_equipment(Equipment::Whiteboard);
        let before = wizard.draft().clone();

        assert_eq!(wizard.edit().unwrap(), WizardStep::Schedule);
        assert_eq!(wizard.back().unwrap(), WizardStep::Details);
        assert_eq!(wizard.draft(), &before);

        assert!(wizard.back().is_err());
        wizard.next(today()).unwrap();
        wizard.next(today()).unwrap();
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_quote_follows_draft_changes() {
        let mut wizard = at_review(SubmissionPolicy::Strict);
        assert_eq!(wizard.quote().total, dec!(600));

        wizard.draft_mut().unwrap().catering_needed = true;
        assert!(wizard.toggle_equipment(Equipment::HdProjector));
        assert!(wizard.toggle_equipment(Equipment::SoundSystem));
        assert_eq!(wizard.quote().total, dec!(1450));

        assert!(!wizard.toggle_equipment(Equipment::SoundSystem));
        assert_eq!(wizard.quote().equipment_cost, dec!(50));
    }

    // ===== Submission tests =====

    #[tokio::test]
    async fn test_submit_reaches_confirmation() {
        let service = service();
        let mut wizard = at_review(SubmissionPolicy::Strict);
        wizard.draft_mut().unwrap().catering_needed = true;

        let confirmation = wizard.submit(&service, today()).await.unwrap();
        assert_eq!(confirmation.status, ConfirmationStatus::Submitted);
        assert_eq!(confirmation.quote.total, dec!(1350));
        assert_eq!(confirmation.support_phone, SUPPORT_PHONE);
        assert!(confirmation.booking.is_some());
        assert_eq!(wizard.step(), WizardStep::Confirmation);
        assert!(wizard.draft_mut().is_none());
        assert!(wizard.back().is_err());

        wizard.close().unwrap();
        assert_eq!(wizard.step(), WizardStep::Details);
        assert_eq!(wizard.draft(), &BookingDraft::default());
    }

    #[tokio::test]
    async fn test_strict_policy_keeps_review_on_store_failure() {
        let service = ConferenceService::new(Arc::new(UnreachableStore), PricingRules::default(), AppCache::new());
        let mut wizard = at_review(SubmissionPolicy::Strict);
        let before = wizard.draft().clone();

        let err = wizard.submit(&service, today()).await.unwrap_err();
        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(wizard.step(), WizardStep::Review);
        assert_eq!(wizard.draft(), &before);
        assert!(wizard.confirmation().is_none());
    }

    #[tokio::test]
    async fn test_optimistic_policy_shows_unconfirmed() {
        let service = ConferenceService::new(Arc::new(UnreachableStore), PricingRules::default(), AppCache::new());
        let mut wizard = at_review(SubmissionPolicy::Optimistic);

        let confirmation = wizard.submit(&service, today()).await.unwrap();
        assert_eq!(confirmation.status, ConfirmationStatus::Unconfirmed);
        assert!(confirmation.booking.is_none());
        assert_eq!(confirmation.quote.total, dec!(600));
        assert_eq!(wizard.step(), WizardStep::Confirmation);
    }

    #[tokio::test]
    async fn test_conflict_blocks_even_when_optimistic() {
        let service = service();
        let mut first = at_review(SubmissionPolicy::Optimistic);
        let booking = first.submit(&service, today()).await.unwrap().booking.unwrap();
        service
            .update_status(booking.id, crate::conference::models::BookingStatus::Confirmed)
            .await
            .unwrap();

        let mut second = at_review(SubmissionPolicy::Optimistic);
        let err = second.submit(&service, today()).await.unwrap_err();
        assert!(matches!(err, BookingError::SlotUnavailable { .. }));
        assert_eq!(second.step(), WizardStep::Review);
    }

    #[test]
    fn test_submission_policy_from_str() {
        assert_eq!("Optimistic".parse::<SubmissionPolicy>().unwrap(), SubmissionPolicy::Optimistic);
        assert_eq!("strict".parse::<SubmissionPolicy>().unwrap(), SubmissionPolicy::Strict);
        assert!("lenient".parse::<SubmissionPolicy>().is_err());
    }
}
