//! Signing error types.
//!
//! Every failure of the hex, hashing and recovery primitives maps to a
//! [`SigningError`]. The pool turns these into request-level rejections.

use thiserror::Error;

/// Errors raised by the signing primitives.
///
/// # Non-exhaustive
///
/// New variants may be added without a semver-breaking change. Downstream
/// match expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SigningError {
    /// Input is not `0x`-prefixed, even-length hexadecimal.
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Decoded bytes do not have the width the type requires.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte width.
        expected: usize,
        /// Width actually decoded.
        actual: usize,
    },

    /// Input is not a non-empty string of decimal digits.
    #[error("Invalid decimal integer: {0:?}")]
    InvalidInteger(String),

    /// Decimal value does not fit in 256 bits.
    #[error("Integer does not fit in 256 bits: {0}")]
    IntegerOverflow(String),

    /// Signature bytes are malformed (length, recovery byte, or scalars).
    #[error("Invalid signature format: {0}")]
    InvalidSignature(String),

    /// Signature is well-formed but no public key can be recovered from it.
    #[error("Signer recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, SigningError>;
