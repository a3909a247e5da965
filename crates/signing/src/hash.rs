//! Keccak hashing, beacon id derivation, and signed-data digests.
//!
//! All inputs are packed at fixed width before hashing (Solidity
//! `abi.encodePacked` rules), so `(A, BC)` and `(AB, C)` never collide:
//!
//! | Function | Packed layout |
//! |----------|---------------|
//! | [`derive_beacon_id`] | `address(20) ‖ bytes32 templateId` |
//! | [`build_digest`] | `bytes32 templateId ‖ uint256 timestamp ‖ bytes payload` |
//! | [`eth_message_hash`] | `"\x19Ethereum Signed Message:\n32" ‖ digest` |

use sha3::{Digest, Keccak256};

use crate::{
    error::{Result, SigningError},
    types::{Address, B256},
};

/// Prefix applied by `personal_sign` style signers to a 32-byte message.
const ETH_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Computes the Keccak-256 hash of `data`.
#[must_use]
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    B256::new(hasher.finalize().into())
}

/// Derives the beacon id of an (airnode, template) pair.
///
/// ```
/// use signed_data_pool_signing::{Address, B256, derive_beacon_id};
///
/// let airnode: Address = "0xc52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4".parse().unwrap();
/// let template: B256 = "0x154c34adf151cf4d91b7abe7eb6dcd193104ef2a29738ddc88020a58d6cf6183"
///     .parse()
///     .unwrap();
///
/// assert_eq!(
///     derive_beacon_id(&airnode, &template).to_string(),
///     "0x4385954e058fbe6b6a744f32a4f89d67aad099f8fb8b23e7ea8dd366ae88151d",
/// );
/// ```
#[must_use]
pub fn derive_beacon_id(airnode: &Address, template_id: &B256) -> B256 {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(airnode.as_bytes());
    packed[20..].copy_from_slice(template_id.as_bytes());
    keccak256(packed)
}

/// Parses a decimal string into a big-endian 256-bit unsigned integer.
///
/// # Errors
///
/// Returns [`SigningError::InvalidInteger`] unless the input is a non-empty
/// run of ASCII digits, and [`SigningError::IntegerOverflow`] when the value
/// is `2^256` or larger.
pub fn uint256_from_decimal(input: &str) -> Result<[u8; 32]> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SigningError::InvalidInteger(input.to_owned()));
    }

    let mut word = [0u8; 32];
    for digit in input.bytes().map(|b| b - b'0') {
        let mut carry = u16::from(digit);
        for byte in word.iter_mut().rev() {
            let acc = u16::from(*byte) * 10 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return Err(SigningError::IntegerOverflow(input.to_owned()));
        }
    }
    Ok(word)
}

/// Builds the digest an airnode signs for one data point.
///
/// `timestamp` is a decimal string; an empty `payload` hashes as zero bytes.
///
/// # Errors
///
/// Propagates [`uint256_from_decimal`] failures for the timestamp.
pub fn build_digest(template_id: &B256, timestamp: &str, payload: &[u8]) -> Result<B256> {
    let timestamp = uint256_from_decimal(timestamp)?;

    let mut packed = Vec::with_capacity(64 + payload.len());
    packed.extend_from_slice(template_id.as_bytes());
    packed.extend_from_slice(&timestamp);
    packed.extend_from_slice(payload);
    Ok(keccak256(packed))
}

/// Applies the EIP-191 signed-message prefix to a 32-byte digest and hashes
/// the result. This is the prehash that is actually signed.
#[must_use]
pub fn eth_message_hash(digest: &B256) -> B256 {
    let mut packed = [0u8; ETH_MESSAGE_PREFIX.len() + 32];
    packed[..ETH_MESSAGE_PREFIX.len()].copy_from_slice(ETH_MESSAGE_PREFIX);
    packed[ETH_MESSAGE_PREFIX.len()..].copy_from_slice(digest.as_bytes());
    keccak256(packed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_keccak_empty_input() {
        assert_eq!(
            keccak256(b"").to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_uint256_small_values() {
        let word = uint256_from_decimal("1683188416").unwrap();
        assert_eq!(&word[28..], &1_683_188_416u32.to_be_bytes());
        assert!(word[..28].iter().all(|&b| b == 0));

        assert_eq!(uint256_from_decimal("0").unwrap(), [0u8; 32]);
        assert_eq!(uint256_from_decimal("000255").unwrap()[31], 0xff);
    }

    #[test]
    fn test_uint256_max_and_overflow() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(uint256_from_decimal(max).unwrap(), [0xff; 32]);

        let over = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(matches!(uint256_from_decimal(over), Err(SigningError::IntegerOverflow(_))));
    }

    #[test]
    fn test_uint256_rejects_non_digits() {
        for bad in ["", "-1", "12a", " 1", "0x10", "1.5"] {
            assert!(
                matches!(uint256_from_decimal(bad), Err(SigningError::InvalidInteger(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_digest_depends_on_every_field() {
        let template = B256::new([1; 32]);
        let base = build_digest(&template, "100", &[0xaa]).unwrap();

        assert_ne!(base, build_digest(&B256::new([2; 32]), "100", &[0xaa]).unwrap());
        assert_ne!(base, build_digest(&template, "101", &[0xaa]).unwrap());
        assert_ne!(base, build_digest(&template, "100", &[0xab]).unwrap());
        assert_ne!(base, build_digest(&template, "100", &[]).unwrap());
    }

    proptest! {
        #[test]
        fn uint256_matches_u128(value in any::<u128>()) {
            let word = uint256_from_decimal(&value.to_string()).unwrap();
            prop_assert_eq!(&word[16..], &value.to_be_bytes());
            prop_assert!(word[..16].iter().all(|&b| b == 0));
        }

        #[test]
        fn beacon_id_is_deterministic_and_input_sensitive(
            airnode in any::<[u8; 20]>(),
            template in any::<[u8; 32]>(),
            flip in 0usize..52,
        ) {
            let a = Address::new(airnode);
            let t = B256::new(template);
            let id = derive_beacon_id(&a, &t);
            prop_assert_eq!(id, derive_beacon_id(&a, &t));

            let (mut a2, mut t2) = (airnode, template);
            if flip < 20 { a2[flip] ^= 1 } else { t2[flip - 20] ^= 1 }
            prop_assert_ne!(id, derive_beacon_id(&Address::new(a2), &B256::new(t2)));
        }
    }
}
