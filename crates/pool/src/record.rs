//! The signed record model and its storage identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use signed_data_pool_signing::{Address, B256, SigningError, derive_beacon_id};

/// Key prefix under which records are stored.
pub const RECORD_PREFIX: &str = "signed-data/";

/// Key prefix of the beacon id index.
pub const BEACON_INDEX_PREFIX: &str = "beacon-index/";

/// One signed oracle data point, exactly as submitted.
///
/// Field values are kept as the submitted strings so a stored record reads
/// back byte-identical. Field order matches the wire schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedRecord {
    pub feed_name: String,
    pub ois_title: String,
    pub beacon_id: String,
    pub airnode: String,
    pub endpoint_id: String,
    pub template_id: String,
    pub parameters: String,
    pub timestamp: String,
    pub encoded_value: String,
    pub signature: String,
}

impl SignedRecord {
    /// Returns the record's storage key.
    ///
    /// # Errors
    ///
    /// Returns a [`SigningError`] if `airnode` or `templateId` is not
    /// well-formed hex of the right width.
    pub fn key(&self) -> Result<RecordKey, SigningError> {
        Ok(RecordKey { airnode: self.airnode.parse()?, template_id: self.template_id.parse()? })
    }
}

/// Canonical identity of a stored record: the `(airnode, templateId)` pair.
///
/// Comparison is on decoded bytes, so hex case never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub airnode: Address,
    pub template_id: B256,
}

impl RecordKey {
    /// Creates a key from its parts.
    #[must_use]
    pub const fn new(airnode: Address, template_id: B256) -> Self {
        Self { airnode, template_id }
    }

    /// Returns the beacon id derived from this key.
    #[must_use]
    pub fn beacon_id(&self) -> B256 {
        derive_beacon_id(&self.airnode, &self.template_id)
    }

    /// Returns the storage key bytes: `signed-data/{airnode}/{templateId}`.
    #[must_use]
    pub fn storage_key(&self) -> Vec<u8> {
        format!("{}{}", partition_prefix(&self.airnode), self.template_id).into_bytes()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.airnode, self.template_id)
    }
}

/// Returns the key prefix shared by all records of one airnode.
#[must_use]
pub fn partition_prefix(airnode: &Address) -> String {
    format!("{RECORD_PREFIX}{}/", airnode.to_lower_hex())
}

/// Returns the beacon index key for `beacon_id`.
#[must_use]
pub fn beacon_index_key(beacon_id: &B256) -> Vec<u8> {
    format!("{BEACON_INDEX_PREFIX}{beacon_id}").into_bytes()
}
