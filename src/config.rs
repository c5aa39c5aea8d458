//! Runtime configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::conference::{PricingRules, SubmissionPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ACCESS_CODE_STORE_PATH: &str = "data/access_codes.json";
const DEFAULT_SUPPORT_PHONE: &str = "+233245678900";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string; bookings stay in memory when unset
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub access_code_store_path: PathBuf,
    /// Human contact shown on the booking confirmation
    pub support_phone: String,
    pub submission_policy: SubmissionPolicy,
    pub pricing: PricingRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            access_code_store_path: PathBuf::from(DEFAULT_ACCESS_CODE_STORE_PATH),
            support_phone: DEFAULT_SUPPORT_PHONE.to_string(),
            submission_policy: SubmissionPolicy::default(),
            pricing: PricingRules::default(),
        }
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

fn positive(key: &'static str, value: String) -> Result<Decimal, ConfigError> {
    let rate: Decimal = parse(key, value.clone())?;
    if rate <= Decimal::ZERO {
        return Err(ConfigError::Invalid {
            key,
            value,
            reason: "must be positive".to_string(),
        });
    }
    Ok(rate)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.database_url = get("DATABASE_URL");
        config.bind_addr = parse(
            "BIND_ADDR",
            get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        if let Some(path) = get("ACCESS_CODE_STORE_PATH") {
            config.access_code_store_path = PathBuf::from(path);
        }
        if let Some(phone) = get("SUPPORT_PHONE") {
            config.support_phone = phone;
        }
        if let Some(policy) = get("SUBMISSION_POLICY") {
            config.submission_policy = parse("SUBMISSION_POLICY", policy)?;
        }

        let pricing = &mut config.pricing;
        if let Some(v) = get("CONFERENCE_HOURLY_RATE") {
            pricing.hourly_rate = positive("CONFERENCE_HOURLY_RATE", v)?;
        }
        if let Some(v) = get("CONFERENCE_CATERING_RATE") {
            pricing.catering_rate = positive("CONFERENCE_CATERING_RATE", v)?;
        }
        if let Some(v) = get("CONFERENCE_EQUIPMENT_RATE") {
            pricing.equipment_rate = positive("CONFERENCE_EQUIPMENT_RATE", v)?;
        }
        if let Some(v) = get("CONFERENCE_DAILY_RATE") {
            pricing.daily_rate = positive("CONFERENCE_DAILY_RATE", v)?;
        }
        if let Some(v) = get("CONFERENCE_CAPACITY") {
            pricing.capacity = parse("CONFERENCE_CAPACITY", v)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.support_phone, "+233245678900");
        assert_eq!(config.submission_policy, SubmissionPolicy::Strict);
        assert_eq!(config.pricing, PricingRules::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SUBMISSION_POLICY", "optimistic"),
            ("CONFERENCE_HOURLY_RATE", "175.50"),
            ("CONFERENCE_CAPACITY", "80"),
            ("DATABASE_URL", "  "),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.submission_policy, SubmissionPolicy::Optimistic);
        assert_eq!(config.pricing.hourly_rate, dec!(175.50));
        assert_eq!(config.pricing.capacity, 80);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = config_from(&[("CONFERENCE_CATERING_RATE", "-5")]).unwrap_err();
        assert!(err.to_string().contains("CONFERENCE_CATERING_RATE"));

        assert!(config_from(&[("SUBMISSION_POLICY", "whenever")]).is_err());
        assert!(config_from(&[("CONFERENCE_CAPACITY", "lots")]).is_err());
    }
}
