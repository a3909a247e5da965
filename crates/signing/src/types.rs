//! Fixed-width EVM value types and hex decoding.
//!
//! Hex strings on the wire are always `0x`-prefixed. Parsing is
//! case-insensitive; [`Address`] renders in EIP-55 checksum form and
//! [`B256`] renders as lowercase hex.

use std::{fmt, str::FromStr};

use k256::ecdsa::VerifyingKey;

use crate::{
    error::{Result, SigningError},
    hash::keccak256,
};

/// Decodes a `0x`-prefixed hex string of any even length (`"0x"` is empty).
///
/// # Errors
///
/// Returns [`SigningError::InvalidHex`] when the prefix is missing, the
/// length is odd, or a non-hex character is present.
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| SigningError::InvalidHex(format!("missing 0x prefix: {input:?}")))?;
    hex::decode(digits).map_err(|e| SigningError::InvalidHex(format!("{input:?}: {e}")))
}

/// Decodes a `0x`-prefixed hex string of exactly `N` bytes.
///
/// # Errors
///
/// Returns [`SigningError::InvalidHex`] for malformed hex and
/// [`SigningError::InvalidLength`] when the width is wrong.
pub fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N]> {
    let bytes = decode_hex(input)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| SigningError::InvalidLength { expected: N, actual: bytes.len() })
}

/// A 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Wraps raw address bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derives the address of a secp256k1 public key: the last 20 bytes of
    /// the keccak hash of the uncompressed point without its tag byte.
    #[must_use]
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[12..]);
        Self(bytes)
    }

    /// Renders the address as lowercase `0x` hex.
    #[must_use]
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Renders the address with EIP-55 mixed-case checksum.
    #[must_use]
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash.as_bytes()[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

/// A 32-byte word: hashes, beacon ids, template ids, endpoint ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct B256([u8; 32]);

impl B256 {
    /// Wraps raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for B256 {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl fmt::Display for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B256({self})")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_requires_prefix() {
        assert!(matches!(decode_hex("abcd"), Err(SigningError::InvalidHex(_))));
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("0xABcd").unwrap(), vec![0xab, 0xcd]);
    }

    #[test]
    fn test_decode_hex_rejects_odd_length() {
        assert!(matches!(decode_hex("0xabc"), Err(SigningError::InvalidHex(_))));
    }

    #[test]
    fn test_decode_fixed_width() {
        let err = decode_fixed::<4>("0x010203").unwrap_err();
        assert_eq!(err, SigningError::InvalidLength { expected: 4, actual: 3 });
    }

    #[test]
    fn test_checksum_known_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(addr.to_string(), expected);
        }
    }

    #[test]
    fn test_address_parse_is_case_insensitive() {
        let mixed: Address = "0xc52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4".parse().unwrap();
        let lower: Address = "0xc52eea00154b4ff1ebbf8ba39fde37f1ac3b9fd4".parse().unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed.to_lower_hex(), "0xc52eea00154b4ff1ebbf8ba39fde37f1ac3b9fd4");
    }

    #[test]
    fn test_b256_display_is_lowercase() {
        let id: B256 = "0x4385954E058FBE6B6A744F32A4F89D67AAD099F8FB8B23E7EA8DD366AE88151D"
            .parse()
            .unwrap();
        assert_eq!(
            id.to_string(),
            "0x4385954e058fbe6b6a744f32a4f89d67aad099f8fb8b23e7ea8dd366ae88151d"
        );
    }
}
