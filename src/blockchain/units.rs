//! Native-unit amount conversions.
//!
//! Amounts live as `U256` wei everywhere inside the crate and cross every
//! serialization boundary (config, JSON API, ledger snapshot) as decimal strings
//! in native units, e.g. `"0.497"`. No floating point is involved in either
//! direction.

use alloy::primitives::U256;
use thiserror::Error;

/// Decimals of the native asset on every EVM chain.
pub const NATIVE_DECIMALS: u32 = 18;

/// Error returned when a decimal amount string cannot be represented in wei.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{0}': expected a non-negative decimal number")]
    Malformed(String),

    #[error("amount '{0}' has more than 18 fractional digits")]
    TooPrecise(String),

    #[error("amount '{0}' overflows 256 bits")]
    Overflow(String),
}

fn wei_per_unit() -> U256 {
    U256::from(10u64).pow(U256::from(NATIVE_DECIMALS))
}

/// Parse a native-unit decimal string ("1", "0.5", ".25") into wei.
pub fn parse_native(amount: &str) -> Result<U256, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Malformed(amount.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Malformed(amount.to_string()));
    }
    if fraction.len() > NATIVE_DECIMALS as usize {
        return Err(AmountError::TooPrecise(amount.to_string()));
    }

    let whole_wei = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)
            .map_err(|_| AmountError::Overflow(amount.to_string()))?
            .checked_mul(wei_per_unit())
            .ok_or_else(|| AmountError::Overflow(amount.to_string()))?
    };

    let fraction_wei = if fraction.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", fraction, width = NATIVE_DECIMALS as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| AmountError::Malformed(amount.to_string()))?
    };

    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))
}

/// Format wei as a native-unit decimal string with trailing zeros trimmed.
pub fn format_native(value: U256) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = wei_per_unit();
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let remainder_str = format!("{:0>width$}", remainder.to_string(), width = NATIVE_DECIMALS as usize);
    let trimmed = remainder_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

/// Serde adapter: `U256` wei <-> native-unit decimal string.
pub mod serde_native {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_native(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_native(&raw).map_err(D::Error::custom)
    }
}

/// Serde adapter for `Option<U256>` fields.
pub mod serde_native_opt {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&super::format_native(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::parse_native(&s).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_native("1").unwrap(), U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(parse_native("0.001").unwrap(), U256::from(1_000_000_000_000_000u64));
        assert_eq!(parse_native(".5").unwrap(), U256::from(500_000_000_000_000_000u64));
        assert_eq!(parse_native("0.000000000000000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_native(""), Err(AmountError::Empty));
        assert!(matches!(parse_native("-1"), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_native("1e18"), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_native("."), Err(AmountError::Malformed(_))));
        assert!(matches!(
            parse_native("0.0000000000000000001"),
            Err(AmountError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_native(U256::ZERO), "0");
        assert_eq!(format_native(parse_native("2").unwrap()), "2");
        assert_eq!(format_native(parse_native("0.497").unwrap()), "0.497");
        assert_eq!(format_native(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_subtraction_is_exact() {
        let balance = parse_native("0.5").unwrap();
        let fee = parse_native("0.002").unwrap();
        let reserve = parse_native("0.001").unwrap();
        assert_eq!(format_native(balance - fee - reserve), "0.497");
    }
}
