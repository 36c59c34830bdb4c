use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Fixed-point denominator for split fractions.
pub const FRACTION_UNIT: i32 = 10_000;
/// Smallest share a split child can be given, in fraction units (0.1).
pub const MIN_FRACTION: i32 = 1_000;

const_assert!(MIN_FRACTION > 0);
const_assert!(2 * MIN_FRACTION < FRACTION_UNIT);

/// Ratio of a split's first child to the whole, stored as an integer
/// multiple of `1 / FRACTION_UNIT` so that dumped and reloaded trees lay
/// out identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fraction(i32);

impl Fraction {
    pub const HALF: Fraction = Fraction(FRACTION_UNIT / 2);

    pub const fn from_units(units: i32) -> Self { Fraction(units) }

    pub fn units(self) -> i32 { self.0 }

    pub fn from_f64(value: f64) -> Self { Fraction((value * f64::from(FRACTION_UNIT)).round() as i32) }

    pub fn as_f64(self) -> f64 { f64::from(self.0) / f64::from(FRACTION_UNIT) }

    /// Clamped into `[MIN_FRACTION, 1 - MIN_FRACTION]`.
    pub fn clamped(self) -> Self { Fraction(self.0.clamp(MIN_FRACTION, FRACTION_UNIT - MIN_FRACTION)) }

    /// `1 - self`.
    pub fn complement(self) -> Self { Fraction(FRACTION_UNIT - self.0) }

    /// Adds a (possibly negative) delta and clamps.
    pub fn adjusted(self, delta: Fraction) -> Self { Fraction(self.0.saturating_add(delta.0)).clamped() }

    /// Share of `length` belonging to the first child, truncated.
    pub fn of(self, length: i32) -> i32 {
        (i64::from(length) * i64::from(self.0) / i64::from(FRACTION_UNIT)) as i32
    }
}

impl Default for Fraction {
    fn default() -> Self { Fraction::HALF }
}

/// Decimal with at most four fractional digits; trailing zeros are dropped
/// but one digit always remains (`0.5`, `0.3333`, `1.0`).
impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let unit = FRACTION_UNIT as u32;
        let mut digits = format!("{:04}", abs % unit);
        while digits.len() > 1 && digits.ends_with('0') {
            digits.pop();
        }
        write!(f, "{sign}{}.{digits}", abs / unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fraction \"{0}\"")]
pub struct FractionParseError(pub String);

/// Accepts plain decimals (`0.5`, `.25`, `-0.05`, `+0.1`). The value is
/// rounded to the nearest unit; clamping is left to the caller since
/// deltas are parsed with the same syntax.
impl FromStr for Fraction {
    type Err = FractionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = !trimmed.is_empty()
            && trimmed.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
        if !valid {
            return Err(FractionParseError(s.to_string()));
        }
        let value: f64 = trimmed.parse().map_err(|_| FractionParseError(s.to_string()))?;
        if !value.is_finite() || value.abs() > 1_000.0 {
            return Err(FractionParseError(s.to_string()));
        }
        Ok(Fraction::from_f64(value))
    }
}
