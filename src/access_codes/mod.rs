//! Role-scoped, single-use access codes for staff signup.

pub mod models;
pub mod registry;
pub mod routes;
pub mod store;

pub use models::{AccessCode, StaffRole, BOOTSTRAP_MANAGER_CODE};
pub use registry::{AccessCodeError, AccessCodeRegistry};
pub use routes::router;
pub use store::{AccessCodeStore, InMemoryAccessCodeStore, JsonFileAccessCodeStore};
