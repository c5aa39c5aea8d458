//! Conference room booking engine.
//!
//! Duration and quote math, availability checks, the booking wizard and
//! the submission flow that hands bookings to a store.

pub mod availability;
pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;
pub mod wizard;

// Re-export commonly used items
pub use availability::{is_available, ExistingBooking, Slot};
pub use calculators::{calculate_hours, compute_quote, round_money, QuoteInput};
pub use models::{
    BookingRequest, BookingStatus, BookingUpdate, ConferenceBooking, PackageType, PricingRules, Quote, StatusChange,
};
pub use queries::PgConferenceBookingStore;
pub use routes::router;
pub use services::{BookingError, ConferenceService};
pub use store::{ConferenceBookingStore, InMemoryConferenceBookingStore};
pub use wizard::{BookingWizard, Confirmation, ConfirmationStatus, SubmissionPolicy, SubmissionSettings};
