//! Shared test utilities for signing and record tests.
//!
//! Provides a [`TestWallet`] that signs digests the way an airnode does, and
//! the field values of a known-good signed data point produced by a real
//! airnode. Gated behind the `testutil` feature.
//!
//! ```toml
//! [dev-dependencies]
//! signed-data-pool-signing = { path = "../signing", features = ["testutil"] }
//! ```

use k256::ecdsa::SigningKey;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{
    hash::{build_digest, eth_message_hash},
    types::{Address, B256},
};

/// Airnode address of the reference data point.
pub const FIXTURE_AIRNODE: &str = "0xc52EeA00154B4fF1EbbF8Ba39FDe37F1AC3B9Fd4";
/// Beacon id derived from [`FIXTURE_AIRNODE`] and [`FIXTURE_TEMPLATE_ID`].
pub const FIXTURE_BEACON_ID: &str =
    "0x4385954e058fbe6b6a744f32a4f89d67aad099f8fb8b23e7ea8dd366ae88151d";
/// Endpoint id of the reference data point.
pub const FIXTURE_ENDPOINT_ID: &str =
    "0x3528e42b017a5fbf9d2993a2df04efc3ed474357575065a111b054ddf9de2acc";
/// Template id of the reference data point.
pub const FIXTURE_TEMPLATE_ID: &str =
    "0x154c34adf151cf4d91b7abe7eb6dcd193104ef2a29738ddc88020a58d6cf6183";
/// Encoded template parameters of the reference data point.
pub const FIXTURE_PARAMETERS: &str = "0x31730000000000000000000000000000000000000000000000000000000000006e616d65000000000000000000000000000000000000000000000000000000004554482f55534400000000000000000000000000000000000000000000000000";
/// Timestamp of the reference data point.
pub const FIXTURE_TIMESTAMP: &str = "1683188416";
/// ABI-encoded `int256` value of the reference data point.
pub const FIXTURE_ENCODED_VALUE: &str =
    "0x000000000000000000000000000000000000000000000066f1ebe9b82d875640";
/// Airnode signature over the reference data point.
pub const FIXTURE_SIGNATURE: &str = "0x2adfd57e47f52243d537514ad2d42729eac14739080c5c498773829dfb82e43a2fbba4f2ddb24b5e7de00dca849a3f75cb1d36026c92167fc89a0855f5a487b91b";
/// Feed name of the reference data point.
pub const FIXTURE_FEED_NAME: &str = "ETH/USD";
/// OIS title of the reference data point.
pub const FIXTURE_OIS_TITLE: &str = "Nodary";

/// A secp256k1 key that signs digests with the EIP-191 prefix.
pub struct TestWallet {
    key: SigningKey,
}

impl TestWallet {
    /// Generates a fresh random wallet.
    #[must_use]
    pub fn random() -> Self {
        Self { key: SigningKey::random(&mut OsRng) }
    }

    /// Builds a wallet from a fixed secret so signatures are reproducible.
    ///
    /// # Panics
    ///
    /// Panics if `secret` is zero or not below the curve order.
    #[must_use]
    pub fn from_secret(secret: [u8; 32]) -> Self {
        let secret = Zeroizing::new(secret);
        Self { key: SigningKey::from_slice(secret.as_slice()).expect("valid secp256k1 secret") }
    }

    /// Returns the wallet's address.
    #[must_use]
    pub fn address(&self) -> Address {
        Address::from_verifying_key(self.key.verifying_key())
    }

    /// Signs `digest` as a message and returns the 65-byte `r ‖ s ‖ v` form.
    ///
    /// # Panics
    ///
    /// Panics if the underlying signer fails.
    #[must_use]
    pub fn sign_digest(&self, digest: &B256) -> [u8; 65] {
        let prehash = eth_message_hash(digest);
        let (signature, recovery_id) =
            self.key.sign_prehash_recoverable(prehash.as_bytes()).expect("prehash signing");
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + u8::from(recovery_id.is_y_odd());
        out
    }

    /// Signs the digest of `(template_id, timestamp, payload)` and returns
    /// the signature as `0x` hex.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a valid decimal integer.
    #[must_use]
    pub fn sign_data(&self, template_id: &B256, timestamp: &str, payload: &[u8]) -> String {
        let digest = build_digest(template_id, timestamp, payload).expect("valid timestamp");
        format!("0x{}", hex::encode(self.sign_digest(&digest)))
    }
}
