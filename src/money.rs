//! Money Module
//!
//! Transfer amounts are exact fixed-point decimals. Floating point never
//! touches a balance: client strings are parsed straight into
//! [`rust_decimal::Decimal`] and bound to `NUMERIC` columns as-is.
//!
//! ## Scale
//! Every amount is validated against an account scale (fractional digits).
//! With scale 2, `"100.5"` and `"100.50"` are accepted, `"100.505"` is not.
//!
//! ```rust
//! use account_transfer::money::Amount;
//!
//! let amount = Amount::parse("100.50", 2).unwrap();
//! assert_eq!(amount.to_string(), "100.50");
//! assert_eq!(Amount::from_minor_units(10050, 2).unwrap(), amount);
//! ```

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest scale a `Decimal` can carry
pub const MAX_SCALE: u32 = 28;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Strictly positive transfer amount with bounded scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal, scale: u32) -> Result<Self, MoneyError> {
        let scale = scale.min(MAX_SCALE);
        if value <= Decimal::ZERO {
            return Err(MoneyError::InvalidAmount);
        }

        // Trailing zeros don't count against the scale: 1.50 at scale 1 is fine
        let provided = value.normalize().scale();
        if provided > scale {
            return Err(MoneyError::PrecisionOverflow {
                provided,
                max: scale,
            });
        }

        // rescale is a no-op when the mantissa can't hold the extra digits
        let mut value = value;
        value.rescale(scale);
        if value.scale() != scale {
            return Err(MoneyError::Overflow);
        }
        Ok(Self(value))
    }

    /// Parse a client string such as `"100"` or `"12.34"`.
    pub fn parse(amount_str: &str, scale: u32) -> Result<Self, MoneyError> {
        let amount_str = amount_str.trim();
        if amount_str.is_empty() {
            return Err(MoneyError::InvalidFormat("empty string".into()));
        }
        if amount_str.starts_with('-') {
            return Err(MoneyError::InvalidAmount);
        }
        if amount_str
            .chars()
            .any(|c| !(c.is_ascii_digit() || c == '.'))
        {
            return Err(MoneyError::InvalidFormat(amount_str.to_string()));
        }

        // Count digits on the raw string: Decimal::from_str rounds past 28 places
        let (whole, frac) = amount_str.split_once('.').unwrap_or((amount_str, ""));
        if frac.contains('.') || (whole.is_empty() && frac.is_empty()) {
            return Err(MoneyError::InvalidFormat(amount_str.to_string()));
        }
        let frac = frac.trim_end_matches('0');
        let max = scale.min(MAX_SCALE);
        let provided = u32::try_from(frac.len()).unwrap_or(u32::MAX);
        if provided > max {
            return Err(MoneyError::PrecisionOverflow { provided, max });
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let normalized = if frac.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, frac)
        };
        // digits only from here on, so the only failure left is magnitude
        let value = Decimal::from_str(&normalized).map_err(|_| MoneyError::Overflow)?;
        Self::new(value, scale)
    }

    /// Build from integer minor units, e.g. cents at scale 2.
    pub fn from_minor_units(units: i64, scale: u32) -> Result<Self, MoneyError> {
        if scale > MAX_SCALE {
            return Err(MoneyError::PrecisionOverflow {
                provided: scale,
                max: MAX_SCALE,
            });
        }
        Self::new(Decimal::new(units, scale), scale)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
