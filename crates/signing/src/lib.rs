//! EVM signing primitives for the signed data pool.
//!
//! An airnode signs each data point by hashing the fixed-width packing of
//! `(templateId, timestamp, encodedValue)` and signing that digest as an
//! EIP-191 message. This crate provides the pieces needed to check such a
//! data point:
//!
//! - [`derive_beacon_id`]: `keccak256(airnode ‖ templateId)`
//! - [`build_digest`]: the digest an airnode signs
//! - [`recover_signer`]: the address that produced a signature over a digest
//! - [`validation`]: hex shape checks for addresses and 32-byte ids
//!
//! # Example
//!
//! ```
//! use signed_data_pool_signing::{B256, build_digest, decode_hex, recover_signer};
//!
//! let template: B256 = "0x154c34adf151cf4d91b7abe7eb6dcd193104ef2a29738ddc88020a58d6cf6183"
//!     .parse()
//!     .unwrap();
//! let payload =
//!     decode_hex("0x000000000000000000000000000000000000000000000066f1ebe9b82d875640").unwrap();
//!
//! let digest = build_digest(&template, "1683188416", &payload).unwrap();
//! let signer = recover_signer(
//!     &digest,
//!     "0x2adfd57e47f52243d537514ad2d42729eac14739080c5c498773829dfb82e43a\
//!      2fbba4f2ddb24b5e7de00dca849a3f75cb1d36026c92167fc89a0855f5a487b91b",
//! )
//! .unwrap();
//!
//! assert_eq!(signer.to_string(), "0xc52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4");
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with a signing test wallet
//!   and reference data point fixtures.

#![deny(unsafe_code)]

pub mod error;
pub mod hash;
pub mod recover;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;
pub mod validation;

pub use error::{Result, SigningError};
pub use hash::{build_digest, derive_beacon_id, eth_message_hash, keccak256, uint256_from_decimal};
pub use recover::{RecoverableSignature, recover_signer};
pub use types::{Address, B256, decode_fixed, decode_hex};
