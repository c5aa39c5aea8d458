//! Currency conversion for price display.
//!
//! Prices are kept in Ghana cedis. Rates express how much of another
//! currency one cedi buys and can be replaced by an administrator.

pub mod routes;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::conference::round_money;

pub use routes::router;

#[derive(Debug, thiserror::Error)]
pub enum CurrencyError {
    #[error("Unsupported currency '{0}'")]
    Unsupported(String),

    #[error("Exchange rate for {0} must be positive")]
    InvalidRate(CurrencyCode),

    #[error("Exchange rate for GHS must be 1")]
    BaseRateChanged,

    #[error("approvedBy is required")]
    MissingApprover,

    #[error("Amount {amount} cannot be converted to {currency}")]
    AmountOutOfRange { amount: Decimal, currency: CurrencyCode },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Ghs,
    Xof,
    Usd,
    Gbp,
    Eur,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 5] = [
        CurrencyCode::Ghs,
        CurrencyCode::Xof,
        CurrencyCode::Usd,
        CurrencyCode::Gbp,
        CurrencyCode::Eur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Ghs => "GHS",
            CurrencyCode::Xof => "XOF",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Eur => "EUR",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CurrencyCode::Ghs => "Ghana Cedis",
            CurrencyCode::Xof => "CFA Franc",
            CurrencyCode::Usd => "US Dollar",
            CurrencyCode::Gbp => "British Pound",
            CurrencyCode::Eur => "Euro",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Ghs => "₵",
            CurrencyCode::Xof => "CFA",
            CurrencyCode::Usd => "$",
            CurrencyCode::Gbp => "£",
            CurrencyCode::Eur => "€",
        }
    }

    /// Units of this currency bought by one cedi, before any admin update
    pub fn default_rate(&self) -> Decimal {
        match self {
            CurrencyCode::Ghs => Decimal::ONE,
            CurrencyCode::Xof => dec!(50.5),
            CurrencyCode::Usd => dec!(0.078),
            CurrencyCode::Gbp => dec!(0.062),
            CurrencyCode::Eur => dec!(0.072),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CurrencyError::Unsupported(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Default,
    Admin,
}

/// Rate table with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRates {
    pub rates: BTreeMap<CurrencyCode, Decimal>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub source: RateSource,
}

impl ExchangeRates {
    pub fn defaults() -> Self {
        Self {
            rates: CurrencyCode::ALL.into_iter().map(|c| (c, c.default_rate())).collect(),
            last_updated: Utc::now(),
            approved_by: None,
            source: RateSource::Default,
        }
    }

    /// Rate for a currency; a missing entry falls back to 1
    pub fn rate(&self, currency: CurrencyCode) -> Decimal {
        self.rates.get(&currency).copied().unwrap_or(Decimal::ONE)
    }

    pub fn convert_from_ghs(&self, amount: Decimal, to: CurrencyCode) -> Result<Decimal, CurrencyError> {
        amount
            .checked_mul(self.rate(to))
            .map(|converted| round_money(converted, 2))
            .ok_or(CurrencyError::AmountOutOfRange { amount, currency: to })
    }

    pub fn convert_to_ghs(&self, amount: Decimal, from: CurrencyCode) -> Result<Decimal, CurrencyError> {
        let rate = self.rate(from);
        if rate.is_zero() {
            return Ok(round_money(amount, 2));
        }
        amount
            .checked_div(rate)
            .map(|converted| round_money(converted, 2))
            .ok_or(CurrencyError::AmountOutOfRange {
                amount,
                currency: CurrencyCode::Ghs,
            })
    }

    /// Cedi price converted and formatted for display
    pub fn display_price(&self, amount_in_ghs: Decimal, currency: CurrencyCode) -> Result<String, CurrencyError> {
        Ok(format_amount(self.convert_from_ghs(amount_in_ghs, currency)?, currency))
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::defaults()
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Two decimals with thousands separators; the CFA symbol goes after the amount.
///
/// ```
/// use rust_decimal_macros::dec;
/// use wgh_booking::currency::{format_amount, CurrencyCode};
///
/// assert_eq!(format_amount(dec!(1450), CurrencyCode::Ghs), "₵1,450.00");
/// assert_eq!(format_amount(dec!(73225), CurrencyCode::Xof), "73,225.00 CFA");
/// ```
pub fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    let rounded = round_money(amount, 2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let number = format!("{}{}.{}", sign, group_thousands(whole), fraction);

    match currency {
        CurrencyCode::Xof => format!("{} {}", number, currency.symbol()),
        _ => format!("{}{}", currency.symbol(), number),
    }
}

/// Shared, admin-replaceable rate table
pub struct ExchangeRateBook {
    rates: RwLock<ExchangeRates>,
}

impl ExchangeRateBook {
    pub fn new(rates: ExchangeRates) -> Self {
        Self {
            rates: RwLock::new(rates),
        }
    }

    pub async fn current(&self) -> ExchangeRates {
        self.rates.read().await.clone()
    }

    pub async fn display_price(&self, amount_in_ghs: Decimal, currency: CurrencyCode) -> Result<String, CurrencyError> {
        self.rates.read().await.display_price(amount_in_ghs, currency)
    }

    /// Replace the rate table; currencies left out keep their current rate
    pub async fn approve(
        &self,
        updates: BTreeMap<CurrencyCode, Decimal>,
        approved_by: &str,
    ) -> Result<ExchangeRates, CurrencyError> {
        if approved_by.trim().is_empty() {
            return Err(CurrencyError::MissingApprover);
        }
        for (currency, rate) in &updates {
            if *currency == CurrencyCode::Ghs && *rate != Decimal::ONE {
                return Err(CurrencyError::BaseRateChanged);
            }
            if *rate <= Decimal::ZERO {
                return Err(CurrencyError::InvalidRate(*currency));
            }
        }

        let mut current = self.rates.write().await;
        current.rates.extend(updates);
        current.last_updated = Utc::now();
        current.approved_by = Some(approved_by.trim().to_string());
        current.source = RateSource::Admin;

        info!(approved_by = %approved_by, "Exchange rates updated");
        Ok(current.clone())
    }
}

impl Default for ExchangeRateBook {
    fn default() -> Self {
        Self::new(ExchangeRates::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Conversion tests =====

    #[test]
    fn test_convert_from_ghs_rounds_to_cents() {
        let rates = ExchangeRates::defaults();
        assert_eq!(rates.convert_from_ghs(dec!(1450), CurrencyCode::Usd).unwrap(), dec!(113.10));
        assert_eq!(rates.convert_from_ghs(dec!(1450), CurrencyCode::Xof).unwrap(), dec!(73225));
        assert_eq!(rates.convert_from_ghs(dec!(1450), CurrencyCode::Ghs).unwrap(), dec!(1450));
    }

    #[test]
    fn test_convert_to_ghs() {
        let rates = ExchangeRates::defaults();
        assert_eq!(rates.convert_to_ghs(dec!(113.10), CurrencyCode::Usd).unwrap(), dec!(1450));
        assert_eq!(rates.convert_to_ghs(dec!(100), CurrencyCode::Eur).unwrap(), dec!(1388.89));
    }

    #[test]
    fn test_conversion_overflow_is_an_error() {
        let rates = ExchangeRates::defaults();
        let err = rates.convert_from_ghs(Decimal::MAX, CurrencyCode::Xof).unwrap_err();
        assert!(matches!(
            err,
            CurrencyError::AmountOutOfRange {
                currency: CurrencyCode::Xof,
                ..
            }
        ));
        assert!(rates.convert_to_ghs(Decimal::MAX, CurrencyCode::Usd).is_err());
        assert!(rates.display_price(Decimal::MAX, CurrencyCode::Xof).is_err());

        // a rate of one never overflows
        assert_eq!(rates.convert_from_ghs(Decimal::MAX, CurrencyCode::Ghs).unwrap(), Decimal::MAX);
    }

    // ===== Formatting tests =====

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1450), CurrencyCode::Ghs), "₵1,450.00");
        assert_eq!(format_amount(dec!(113.1), CurrencyCode::Usd), "$113.10");
        assert_eq!(format_amount(dec!(1234567.891), CurrencyCode::Gbp), "£1,234,567.89");
        assert_eq!(format_amount(dec!(999), CurrencyCode::Eur), "€999.00");
        assert_eq!(format_amount(dec!(0), CurrencyCode::Xof), "0.00 CFA");
    }

    #[test]
    fn test_display_price() {
        let rates = ExchangeRates::defaults();
        assert_eq!(rates.display_price(dec!(3900), CurrencyCode::Usd).unwrap(), "$304.20");
    }

    #[test]
    fn test_currency_code_parsing() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::Usd);
        assert_eq!(serde_json::to_value(CurrencyCode::Xof).unwrap(), "XOF");
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }

    // ===== Rate book tests =====

    #[tokio::test]
    async fn test_approve_replaces_rates() {
        let book = ExchangeRateBook::default();
        let updated = book
            .approve([(CurrencyCode::Usd, dec!(0.08))].into_iter().collect(), "finance@wgh.com")
            .await
            .unwrap();

        assert_eq!(updated.source, RateSource::Admin);
        assert_eq!(updated.approved_by.as_deref(), Some("finance@wgh.com"));
        assert_eq!(updated.rate(CurrencyCode::Usd), dec!(0.08));
        assert_eq!(updated.rate(CurrencyCode::Eur), dec!(0.072));
        assert_eq!(book.display_price(dec!(1000), CurrencyCode::Usd).await.unwrap(), "$80.00");
    }

    #[tokio::test]
    async fn test_approve_rejects_bad_rates() {
        let book = ExchangeRateBook::default();
        let err = book
            .approve([(CurrencyCode::Eur, dec!(0))].into_iter().collect(), "finance@wgh.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CurrencyError::InvalidRate(CurrencyCode::Eur)));

        let err = book
            .approve([(CurrencyCode::Ghs, dec!(2))].into_iter().collect(), "finance@wgh.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CurrencyError::BaseRateChanged));

        assert!(book.approve(BTreeMap::new(), " ").await.is_err());
        assert_eq!(book.current().await.source, RateSource::Default);
    }
}
