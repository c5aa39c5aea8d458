//! Issuing and checking staff access codes.
//!
//! Every read-modify-write of the store happens under one mutex, so two
//! signups racing for the same code in this process cannot both consume it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::StoreError;

use super::models::{AccessCode, StaffRole, BOOTSTRAP_MANAGER_CODE};
use super::store::AccessCodeStore;

/// Reasons a code cannot be used
#[derive(Debug, thiserror::Error)]
pub enum AccessCodeError {
    #[error("Invalid access code")]
    NotFound,

    #[error("Access code has been deactivated")]
    Deactivated,

    #[error("Access code has already been used")]
    AlreadyUsed,

    #[error("Access code is for {actual} role, not {expected}")]
    RoleMismatch { actual: StaffRole, expected: StaffRole },

    #[error("Access code store error: {0}")]
    Store(#[from] StoreError),
}

/// Checks run in order: existence, active, unused, role
fn check<'a>(
    codes: &'a [AccessCode],
    code: &str,
    expected_role: Option<StaffRole>,
) -> Result<(usize, &'a AccessCode), AccessCodeError> {
    let (index, record) = codes
        .iter()
        .enumerate()
        .find(|(_, c)| c.code == code)
        .ok_or(AccessCodeError::NotFound)?;

    if !record.is_active {
        return Err(AccessCodeError::Deactivated);
    }
    if record.is_used() {
        return Err(AccessCodeError::AlreadyUsed);
    }
    if let Some(expected) = expected_role {
        if record.role != expected {
            return Err(AccessCodeError::RoleMismatch {
                actual: record.role,
                expected,
            });
        }
    }
    Ok((index, record))
}

fn check_bootstrap(expected_role: Option<StaffRole>) -> Result<AccessCode, AccessCodeError> {
    match expected_role {
        None | Some(StaffRole::Manager) => Ok(AccessCode::bootstrap(Utc::now())),
        Some(expected) => Err(AccessCodeError::RoleMismatch {
            actual: StaffRole::Manager,
            expected,
        }),
    }
}

pub struct AccessCodeRegistry {
    store: Arc<dyn AccessCodeStore>,
    write_lock: Mutex<()>,
}

impl AccessCodeRegistry {
    pub fn new(store: Arc<dyn AccessCodeStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Generate a new code for `role` and append it to the store
    pub async fn issue(&self, role: StaffRole, issuer: &str) -> Result<AccessCode, AccessCodeError> {
        let _guard = self.write_lock.lock().await;

        let mut codes = self.store.load().await?;
        let record = AccessCode::issue(role, issuer, Utc::now());
        codes.push(record.clone());
        self.store.save(&codes).await?;

        info!(role = %role, issuer = %issuer, "Issued access code {}", record.code);
        Ok(record)
    }

    /// Check a presented code, optionally for a specific role
    pub async fn validate(&self, code: &str, expected_role: Option<StaffRole>) -> Result<AccessCode, AccessCodeError> {
        let code = code.trim();
        if code == BOOTSTRAP_MANAGER_CODE {
            return check_bootstrap(expected_role);
        }

        let codes = self.store.load().await?;
        match check(&codes, code, expected_role) {
            Ok((_, record)) => Ok(record.clone()),
            Err(e) => {
                warn!("Rejected access code {}: {}", code, e);
                Err(e)
            }
        }
    }

    /// Mark a code as used by `used_by`.
    ///
    /// Unknown, deactivated and already used codes are reported. The
    /// bootstrap code is never recorded as used.
    pub async fn consume(&self, code: &str, used_by: &str) -> Result<AccessCode, AccessCodeError> {
        self.mark_used(code, None, used_by).await
    }

    /// Validate for `role` and consume in one step
    pub async fn redeem(&self, code: &str, role: StaffRole, used_by: &str) -> Result<AccessCode, AccessCodeError> {
        self.mark_used(code, Some(role), used_by).await
    }

    async fn mark_used(
        &self,
        code: &str,
        expected_role: Option<StaffRole>,
        used_by: &str,
    ) -> Result<AccessCode, AccessCodeError> {
        let code = code.trim();
        if code == BOOTSTRAP_MANAGER_CODE {
            return check_bootstrap(expected_role);
        }

        let _guard = self.write_lock.lock().await;

        let mut codes = self.store.load().await?;
        let (index, _) = check(&codes, code, expected_role).map_err(|e| {
            warn!("Cannot consume access code {}: {}", code, e);
            e
        })?;

        let record = &mut codes[index];
        record.used_by = Some(used_by.to_string());
        record.used_at = Some(Utc::now());
        let record = record.clone();
        self.store.save(&codes).await?;

        info!(role = %record.role, used_by = %used_by, "Access code {} consumed", record.code);
        Ok(record)
    }

    /// Deactivate a code; deactivating twice is not an error
    pub async fn deactivate(&self, code: &str) -> Result<AccessCode, AccessCodeError> {
        let _guard = self.write_lock.lock().await;

        let mut codes = self.store.load().await?;
        let record = codes
            .iter_mut()
            .find(|c| c.code == code.trim())
            .ok_or(AccessCodeError::NotFound)?;

        if !record.is_active {
            return Ok(record.clone());
        }
        record.is_active = false;
        let record = record.clone();
        self.store.save(&codes).await?;

        info!("Access code {} deactivated", record.code);
        Ok(record)
    }

    /// Active, unused codes created by `issuer`
    pub async fn list_issued_by(&self, issuer: &str) -> Result<Vec<AccessCode>, AccessCodeError> {
        let codes = self.store.load().await?;
        Ok(codes
            .into_iter()
            .filter(|c| c.created_by == issuer && c.is_outstanding())
            .collect())
    }
}
