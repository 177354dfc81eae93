//! Token amounts in base units.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decimal places of the token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Base units in one whole token (10^18).
pub const BASE_UNITS_PER_TOKEN: u128 = 10u128.pow(TOKEN_DECIMALS);

/// A non-negative token amount, counted in base units.
///
/// Arithmetic is only exposed in checked form so a balance can neither wrap
/// on credit nor go below zero on debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero base units.
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Create from a raw base-unit count.
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from a whole-token count (`whole` × 10^18 base units).
    pub const fn from_whole(whole: u64) -> Self {
        Self(whole as u128 * BASE_UNITS_PER_TOKEN)
    }

    /// Convert a human-readable token quantity (e.g. `10.5`) to base units.
    ///
    /// Returns `None` for negative values, values with more than 18
    /// significant fractional digits, or values that do not fit.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        let value = value.normalize();
        let scale = value.scale();
        if scale > TOKEN_DECIMALS {
            return None;
        }
        let mantissa = u128::try_from(value.mantissa()).ok()?;
        mantissa
            .checked_mul(10u128.pow(TOKEN_DECIMALS - scale))
            .map(Self)
    }

    /// Get the raw base-unit count.
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction; `None` if the result would be negative.
    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Whole-token value as a decimal with 18 places of scale.
    ///
    /// Returns `None` past the 96-bit mantissa limit of `Decimal`, which is
    /// well above the fixed supply.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, TOKEN_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for TokenAmount {
    /// Renders whole tokens, e.g. `10` or `0.5`, without trailing zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.to_decimal() {
            return write!(f, "{}", value);
        }

        // Past the Decimal range
        let whole = self.0 / BASE_UNITS_PER_TOKEN;
        let frac = self.0 % BASE_UNITS_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = TOKEN_DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = std::num::ParseIntError;

    /// Parses a base-unit count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Self)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
