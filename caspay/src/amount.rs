//! CSPR amounts and their conversion to motes.
//!
//! One CSPR is 10^9 motes. Conversion from display units always truncates
//! (floor) rather than rounds, so sub-mote precision in user input is
//! dropped: `1.0000000009` CSPR becomes `1_000_000_000` motes.

use std::fmt::{self, Display, Formatter};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of motes in one CSPR.
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;

/// Errors raised while converting a display amount to motes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The amount is negative, NaN or infinite.
    #[error("amount must be a finite, non-negative number")]
    Invalid,

    /// The amount does not fit in a `u64` of motes.
    #[error("amount is too large")]
    Overflow,

    /// The amount string is not a decimal number.
    #[error("invalid amount '{0}'")]
    Parse(String),
}

/// An amount of the Casper native asset in motes.
///
/// Serialized as a decimal string, which is how Casper deploy JSON carries
/// `U512` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Motes(u64);

impl Motes {
    /// Creates an amount from a raw mote count.
    #[must_use]
    pub const fn new(motes: u64) -> Self {
        Self(motes)
    }

    /// Returns the raw mote count.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Converts a CSPR amount to motes as `floor(amount * 10^9)`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Invalid`] for negative or non-finite input and
    /// [`AmountError::Overflow`] when the result exceeds `u64::MAX`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_cspr(amount: f64) -> Result<Self, AmountError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AmountError::Invalid);
        }
        let motes = (amount * MOTES_PER_CSPR as f64).floor();
        if motes >= u64::MAX as f64 {
            return Err(AmountError::Overflow);
        }
        // Range checked above.
        Ok(Self(motes as u64))
    }

    /// Converts a decimal CSPR string (e.g. `"2.5"`) to motes, truncating
    /// past the ninth decimal place without going through floating point.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Parse`] for malformed input,
    /// [`AmountError::Invalid`] for negative amounts and
    /// [`AmountError::Overflow`] when the result exceeds `u64::MAX`.
    pub fn from_cspr_str(amount: &str) -> Result<Self, AmountError> {
        let value: Decimal = amount
            .trim()
            .parse()
            .map_err(|_| AmountError::Parse(amount.to_owned()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Invalid);
        }
        value
            .checked_mul(Decimal::from(MOTES_PER_CSPR))
            .ok_or(AmountError::Overflow)?
            .floor()
            .to_u64()
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Returns the amount in CSPR as a floating point value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_cspr(self) -> f64 {
        self.0 as f64 / MOTES_PER_CSPR as f64
    }
}

impl Display for Motes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Motes {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for Motes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Motes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let motes = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("motes must be a non-negative integer"))?;
        Ok(Self(motes))
    }
}
