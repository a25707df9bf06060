//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., shillings, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(minor, 2),
            currency_code,
        }
    }

    /// The amount in minor units (cents), rounded half away from zero.
    ///
    /// Returns `None` if the value does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Format for display, e.g. `KSh 1,500.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {}",
            self.currency_code.symbol(),
            format_amount(self.amount)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Format a decimal amount with two decimals and thousands separators.
///
/// ```
/// use rust_decimal::Decimal;
/// use rwaya_core::format_amount;
///
/// assert_eq!(format_amount(Decimal::new(1_234_567, 1)), "123,456.70");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let plain = format!("{rounded:.2}");
    let (sign, digits) = plain
        .strip_prefix('-')
        .map_or(("", plain.as_str()), |rest| ("-", rest));
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}.{fraction}")
}

/// ISO 4217 currency codes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KES,
    UGX,
    TZS,
    USD,
}

impl CurrencyCode {
    /// Display symbol used in front of amounts.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::KES => "KSh",
            Self::UGX => "USh",
            Self::TZS => "TSh",
            Self::USD => "$",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KES => "KES",
            Self::UGX => "UGX",
            Self::TZS => "TZS",
            Self::USD => "USD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KES" => Ok(Self::KES),
            "UGX" => Ok(Self::UGX),
            "TZS" => Ok(Self::TZS),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(Decimal::new(0, 0)), "0.00");
        assert_eq!(format_amount(Decimal::new(250, 0)), "250.00");
        assert_eq!(format_amount(Decimal::new(1500, 0)), "1,500.00");
        assert_eq!(format_amount(Decimal::new(123_456_789, 2)), "1,234,567.89");
        assert_eq!(format_amount(Decimal::new(-150_000, 2)), "-1,500.00");
    }

    #[test]
    fn test_format_amount_rounds_to_cents() {
        assert_eq!(format_amount(Decimal::new(19_999, 3)), "20.00");
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(1500, 0), CurrencyCode::KES);
        assert_eq!(price.display(), "KSh 1,500.00");
        assert_eq!(price.to_string(), "KSh 1,500.00");
    }

    #[test]
    fn test_minor_units() {
        let price = Price::new(Decimal::new(55_050, 2), CurrencyCode::KES);
        assert_eq!(price.to_minor_units(), Some(55_050));

        let back = Price::from_minor_units(55_050, CurrencyCode::KES);
        assert_eq!(back.amount, Decimal::new(55_050, 2));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        let price = Price::new(Decimal::MAX, CurrencyCode::KES);
        assert_eq!(price.to_minor_units(), None);

        let price = Price::new(Decimal::new(i64::MAX, 0), CurrencyCode::KES);
        assert_eq!(price.to_minor_units(), None);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("kes".parse::<CurrencyCode>().unwrap(), CurrencyCode::KES);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
