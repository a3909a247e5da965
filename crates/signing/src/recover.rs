//! Signer recovery for EIP-191 signed digests.
//!
//! Airnodes sign `eth_message_hash(digest)`, not the raw digest. Recovery must
//! apply the same prefix, otherwise it yields a valid-looking but wrong
//! address.
//!
//! Accepted signature encodings:
//!
//! - 65 bytes `r ‖ s ‖ v` with `v` in `{0, 1, 27, 28}`
//! - 64 bytes `r ‖ yParityAndS` (EIP-2098 compact form)
//!
//! High-`s` signatures are normalized to low-`s` with the recovery parity
//! flipped, which recovers the same key.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::{
    error::{Result, SigningError},
    hash::eth_message_hash,
    types::{Address, B256, decode_hex},
};

/// An ECDSA signature together with its recovery parity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Parses a 65-byte or 64-byte (EIP-2098) signature.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidSignature`] for any other length, an
    /// unknown recovery byte, or scalars outside the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (rs, parity) = match bytes.len() {
            65 => {
                let parity = match bytes[64] {
                    0 | 27 => false,
                    1 | 28 => true,
                    v => {
                        return Err(SigningError::InvalidSignature(format!(
                            "unsupported recovery byte {v}"
                        )));
                    },
                };
                let mut rs = [0u8; 64];
                rs.copy_from_slice(&bytes[..64]);
                (rs, parity)
            },
            64 => {
                let mut rs = [0u8; 64];
                rs.copy_from_slice(bytes);
                let parity = rs[32] & 0x80 != 0;
                rs[32] &= 0x7f;
                (rs, parity)
            },
            len => {
                return Err(SigningError::InvalidSignature(format!(
                    "expected 64 or 65 bytes, got {len}"
                )));
            },
        };

        let signature = Signature::from_slice(&rs)
            .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;

        Ok(match signature.normalize_s() {
            Some(low_s) => Self { signature: low_s, recovery_id: RecoveryId::new(!parity, false) },
            None => Self { signature, recovery_id: RecoveryId::new(parity, false) },
        })
    }

    /// Parses a `0x`-prefixed hex signature.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidHex`] for malformed hex, otherwise as
    /// [`from_bytes`](Self::from_bytes).
    pub fn from_hex(input: &str) -> Result<Self> {
        Self::from_bytes(&decode_hex(input)?)
    }

    /// Returns the 65-byte `r ‖ s ‖ v` encoding with `v` in `{27, 28}`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.signature.to_bytes());
        out[64] = 27 + u8::from(self.recovery_id.is_y_odd());
        out
    }

    /// Recovers the address that signed `prehash`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::RecoveryFailed`] if no key matches.
    pub fn recover_prehash(&self, prehash: &B256) -> Result<Address> {
        let key =
            VerifyingKey::recover_from_prehash(prehash.as_bytes(), &self.signature, self.recovery_id)
                .map_err(|e| SigningError::RecoveryFailed(e.to_string()))?;
        Ok(Address::from_verifying_key(&key))
    }
}

/// Recovers the signer of an EIP-191 signed 32-byte `digest`.
///
/// # Errors
///
/// Returns [`SigningError::InvalidHex`] or [`SigningError::InvalidSignature`]
/// for a malformed signature and [`SigningError::RecoveryFailed`] when the
/// signature does not correspond to any key.
#[tracing::instrument(level = "trace", skip_all, fields(digest = %digest))]
pub fn recover_signer(digest: &B256, signature_hex: &str) -> Result<Address> {
    let signature = RecoverableSignature::from_hex(signature_hex)?;
    signature.recover_prehash(&eth_message_hash(digest))
}
