//! Hex format checks for the identifier fields of a signed record.
//!
//! These are shape checks only (prefix, width, alphabet). They accept mixed
//! case and never verify an EIP-55 checksum.

/// Returns `true` if `s` is `0x` followed by exactly `digits` hex characters.
fn is_prefixed_hex(s: &str, digits: usize) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|rest| rest.len() == digits && rest.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Returns `true` if `s` is shaped like an EVM address (`0x` + 40 hex).
///
/// ```
/// use signed_data_pool_signing::validation::is_evm_address;
///
/// assert!(is_evm_address("0xc52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4"));
/// assert!(!is_evm_address("c52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4"));
/// ```
#[must_use]
pub fn is_evm_address(s: &str) -> bool {
    is_prefixed_hex(s, 40)
}

/// Returns `true` if `s` is shaped like a 32-byte EVM id (`0x` + 64 hex).
#[must_use]
pub fn is_evm_id(s: &str) -> bool {
    is_prefixed_hex(s, 64)
}
