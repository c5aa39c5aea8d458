//! Staff access code records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codes::{random_base36, to_base36};

/// Fixed code that always admits the first manager
pub const BOOTSTRAP_MANAGER_CODE: &str = "WGH-MGR-2026-INIT";

/// Issuer recorded on the bootstrap code
pub const SYSTEM_ISSUER: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Manager,
    Receptionist,
    Staff,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Manager => "manager",
            StaffRole::Receptionist => "receptionist",
            StaffRole::Staff => "staff",
        }
    }

    /// Role segment of a generated code
    pub fn code_prefix(&self) -> &'static str {
        match self {
            StaffRole::Manager => "MGR",
            StaffRole::Receptionist => "RCPT",
            StaffRole::Staff => "STFF",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(StaffRole::Manager),
            "receptionist" => Ok(StaffRole::Receptionist),
            "staff" => Ok(StaffRole::Staff),
            other => Err(format!("unknown staff role '{}'", other)),
        }
    }
}

fn default_active() -> bool {
    true
}

/// A single-use, role-scoped code for staff signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCode {
    pub code: String,
    pub role: StaffRole,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

impl AccessCode {
    /// Fresh, active, unused code for a role
    pub fn issue(role: StaffRole, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            code: generate_code(role, now),
            role,
            created_by: created_by.to_string(),
            created_at: now,
            is_active: true,
            used_by: None,
            used_at: None,
        }
    }

    /// Record returned when the bootstrap code validates
    pub fn bootstrap(now: DateTime<Utc>) -> Self {
        Self {
            code: BOOTSTRAP_MANAGER_CODE.to_string(),
            role: StaffRole::Manager,
            created_by: SYSTEM_ISSUER.to_string(),
            created_at: now,
            is_active: true,
            used_by: None,
            used_at: None,
        }
    }

    pub fn is_used(&self) -> bool {
        self.used_by.is_some()
    }

    /// Active and not yet used
    pub fn is_outstanding(&self) -> bool {
        self.is_active && !self.is_used()
    }
}

/// `WGH-<ROLE>-<base36 millis>-<4 random base36>`, all uppercase
pub fn generate_code(role: StaffRole, now: DateTime<Utc>) -> String {
    format!(
        "WGH-{}-{}-{}",
        role.code_prefix(),
        to_base36(now.timestamp_millis().unsigned_abs()),
        random_base36(4)
    )
}
