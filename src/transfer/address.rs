//! Destination address validation.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must be 40 hex digits, got '{0}'")]
    Malformed(String),

    #[error("zero address is not a valid destination")]
    Zero,

    #[error("EIP-55 checksum mismatch for {0}")]
    BadChecksum(String),
}

/// Parse a destination address.
///
/// Accepts `0x` + 40 hex digits, not the zero address. All-lowercase and
/// all-uppercase forms are taken as-is; mixed case must carry a valid EIP-55
/// checksum.
pub fn validate_address(input: &str) -> Result<Address, AddressError> {
    let input = input.trim();
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;

    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::Malformed(input.to_string()));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());

    let address = if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{}", digits), None)
            .map_err(|_| AddressError::BadChecksum(input.to_string()))?
    } else {
        digits
            .parse::<Address>()
            .map_err(|_| AddressError::Malformed(input.to_string()))?
    };

    if address.is_zero() {
        return Err(AddressError::Zero);
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_valid_forms() {
        let expected: Address = CHECKSUMMED.to_lowercase().parse().unwrap();
        assert_eq!(validate_address(CHECKSUMMED).unwrap(), expected);
        assert_eq!(validate_address(&CHECKSUMMED.to_lowercase()).unwrap(), expected);
        let upper = format!("0x{}", CHECKSUMMED[2..].to_uppercase());
        assert_eq!(validate_address(&upper).unwrap(), expected);
    }

    #[test]
    fn test_bad_checksum() {
        let broken = CHECKSUMMED.replace("f39F", "f39f");
        assert!(matches!(validate_address(&broken), Err(AddressError::BadChecksum(_))));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(validate_address("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"), Err(AddressError::MissingPrefix));
        assert!(matches!(validate_address("0x1234"), Err(AddressError::Malformed(_))));
        assert!(matches!(
            validate_address("0xzz9fd6e51aad88f6f4ce6ab8827279cfffb92266"),
            Err(AddressError::Malformed(_))
        ));
        assert!(matches!(validate_address("not-an-address"), Err(AddressError::MissingPrefix)));
    }

    #[test]
    fn test_zero_address() {
        assert_eq!(
            validate_address("0x0000000000000000000000000000000000000000"),
            Err(AddressError::Zero)
        );
    }
}
