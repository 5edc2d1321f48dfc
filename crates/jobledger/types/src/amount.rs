//! Token amounts and basis points

use crate::error::{LedgerError, LedgerResult};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// An amount of the settlement token, in its smallest unit.
///
/// Serialized as a decimal string so 128-bit values survive JSON consumers;
/// plain integers are accepted on input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-negative integer or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(v as u128))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u128::try_from(v)
            .map(Amount)
            .map_err(|_| E::custom("amount must not be negative"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.trim()
            .parse::<u128>()
            .map(Amount)
            .map_err(|_| E::custom(format!("invalid amount {:?}", v)))
    }
}

/// A ratio expressed in basis points, always within `0..=10_000`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct Bps(u16);

impl Bps {
    pub const ZERO: Bps = Bps(0);
    pub const MAX: Bps = Bps(BPS_DENOMINATOR);

    pub fn new(value: u16) -> LedgerResult<Self> {
        if value > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidParameters(format!(
                "basis points {} exceed {}",
                value, BPS_DENOMINATOR
            )));
        }
        Ok(Self(value))
    }

    /// Accepts wider integers from setter payloads; anything past 10_000 is rejected.
    pub fn from_u64(value: u64) -> LedgerResult<Self> {
        let narrowed = u16::try_from(value).map_err(|_| {
            LedgerError::InvalidParameters(format!(
                "basis points {} exceed {}",
                value, BPS_DENOMINATOR
            ))
        })?;
        Self::new(narrowed)
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Bps {
    type Error = LedgerError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bps> for u16 {
    fn from(value: Bps) -> Self {
        value.0
    }
}

impl std::fmt::Display for Bps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_bounds() {
        assert!(Bps::new(0).is_ok());
        assert!(Bps::new(10_000).is_ok());
        assert!(matches!(
            Bps::new(10_001),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert!(Bps::from_u64(70_000).is_err());
        assert_eq!(Bps::from_u64(250).unwrap().get(), 250);
    }

    #[test]
    fn bps_deserialization_is_checked() {
        let ok: Bps = serde_json::from_str("500").unwrap();
        assert_eq!(ok.get(), 500);
        let bad: Result<Bps, _> = serde_json::from_str("20000");
        assert!(bad.is_err());
    }

    #[test]
    fn amount_arithmetic() {
        let a = Amount::new(10);
        assert_eq!(a.checked_add(Amount::new(5)), Some(Amount::new(15)));
        assert_eq!(a.checked_sub(Amount::new(11)), None);
        assert_eq!(Amount::new(u128::MAX).checked_add(Amount::new(1)), None);
        assert_eq!(a.saturating_sub(Amount::new(11)), Amount::ZERO);
    }

    #[test]
    fn amount_serde_accepts_numbers_and_strings() {
        let big = Amount::new(u128::MAX);
        let json = serde_json::to_string(&big).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        assert_eq!(serde_json::from_str::<Amount>(&json).unwrap(), big);

        assert_eq!(serde_json::from_str::<Amount>("10000").unwrap(), Amount::new(10_000));
        assert!(serde_json::from_str::<Amount>("-1").is_err());
        assert!(serde_json::from_str::<Amount>("\"12x\"").is_err());
    }
}
