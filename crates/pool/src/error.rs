//! Request-level error taxonomy.
//!
//! Every rejection the pool can produce is a [`PoolError`]. Each variant maps
//! to one HTTP status and one fixed client-facing message; `detail` carries
//! the underlying cause and `causing` echoes the offending record for batch
//! requests.

use signed_data_pool_signing::{Address, B256, SigningError};
use signed_data_pool_storage::StorageError;
use thiserror::Error;

use crate::record::SignedRecord;

pub(crate) const MSG_BODY_MISSING: &str = "Invalid request, http body is missing";
pub(crate) const MSG_BODY_NOT_JSON: &str = "Invalid request, body must be in JSON";
pub(crate) const MSG_RECORD_SCHEMA: &str = "Invalid request, body must fit schema for signed data";
pub(crate) const MSG_BATCH_SCHEMA: &str =
    "Invalid request, body must fit schema for batch of signed data";
pub(crate) const MSG_PATH_AIRNODE_MISSING: &str =
    "Invalid request, path parameter airnode address is missing";
pub(crate) const MSG_PATH_NOT_ADDRESS: &str =
    "Invalid request, path parameter must be an EVM address";
pub(crate) const MSG_PATH_NOT_ID: &str = "Invalid request, path parameter must be an EVM id";
pub(crate) const MSG_READ_FOR_FRESHNESS: &str =
    "Unable to get signed data from database to validate timestamp";
pub(crate) const MSG_WRITE: &str = "Unable to send signed data to database";
pub(crate) const MSG_BATCH_WRITE: &str = "Unable to send batch of signed data to database";
pub(crate) const MSG_READ: &str = "Unable to get signed data from database";
pub(crate) const MSG_SCAN: &str = "Unable to scan database";
pub(crate) const MSG_HEALTH: &str = "Database is unavailable";

/// Errors returned by the validation and upsert pipeline.
///
/// # Non-exhaustive
///
/// New variants may be added without a semver-breaking change. Downstream
/// match expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Body missing, not JSON, or not matching the schema.
    #[error("{message}")]
    MalformedRequest {
        /// Client-facing message.
        message: &'static str,
        /// Which check failed.
        detail: Option<String>,
    },

    /// The signature could not be parsed or no signer could be recovered.
    #[error("Unable to recover signer address")]
    SignatureRecovery {
        #[source]
        source: SigningError,
        causing: Option<Box<SignedRecord>>,
    },

    /// The recovered signer is not the record's airnode.
    #[error("Signature is invalid")]
    SignatureMismatch { recovered: Address, causing: Option<Box<SignedRecord>> },

    /// The beacon id could not be derived from airnode and template id.
    #[error("Unable to derive beaconId by given airnode and templateId")]
    Derivation {
        #[source]
        source: SigningError,
        causing: Option<Box<SignedRecord>>,
    },

    /// The submitted beacon id is not the derived one.
    #[error("beaconId is invalid")]
    IdentifierMismatch { derived: B256, causing: Option<Box<SignedRecord>> },

    /// A batch names the same `(airnode, templateId)` more than once.
    #[error("No duplications are allowed")]
    DuplicateKeys { unique: usize, total: usize },

    /// The stored record is at least as new as the candidate.
    #[error("Request isn't updating the timestamp")]
    StaleTimestamp { stored: String, causing: Option<Box<SignedRecord>> },

    /// A storage call failed.
    #[error("{message}")]
    StorageUnavailable {
        message: &'static str,
        #[source]
        source: StorageError,
        causing: Option<Box<SignedRecord>>,
    },

    /// Nothing is stored under the requested key.
    #[error("Signed data not found")]
    NotFound { key: String },

    /// A validation task could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PoolError {
    pub(crate) fn malformed(message: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedRequest { message, detail: Some(detail.into()) }
    }

    pub(crate) fn storage(message: &'static str, source: StorageError) -> Self {
        Self::StorageUnavailable { message, source, causing: None }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::StorageUnavailable { .. } | Self::Internal(_) => 500,
            Self::NotFound { .. } => 404,
            _ => 400,
        }
    }

    /// Returns the fixed client-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }

    /// Returns the underlying cause, if any.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::MalformedRequest { detail, .. } => detail.clone(),
            Self::SignatureRecovery { source, .. } | Self::Derivation { source, .. } => {
                Some(source.to_string())
            },
            Self::StorageUnavailable { source, .. } => Some(source.to_string()),
            Self::NotFound { key } => Some(key.clone()),
            Self::Internal(detail) => Some(detail.clone()),
            _ => None,
        }
    }

    /// Returns the offending record attached by a batch phase.
    #[must_use]
    pub fn causing(&self) -> Option<&SignedRecord> {
        match self {
            Self::SignatureRecovery { causing, .. }
            | Self::SignatureMismatch { causing, .. }
            | Self::Derivation { causing, .. }
            | Self::IdentifierMismatch { causing, .. }
            | Self::StaleTimestamp { causing, .. }
            | Self::StorageUnavailable { causing, .. } => causing.as_deref(),
            _ => None,
        }
    }

    /// Attaches the offending record. Variants that never carry one are
    /// returned unchanged.
    #[must_use]
    pub fn with_causing(mut self, record: &SignedRecord) -> Self {
        match &mut self {
            Self::SignatureRecovery { causing, .. }
            | Self::SignatureMismatch { causing, .. }
            | Self::Derivation { causing, .. }
            | Self::IdentifierMismatch { causing, .. }
            | Self::StaleTimestamp { causing, .. }
            | Self::StorageUnavailable { causing, .. } => {
                *causing = Some(Box::new(record.clone()));
            },
            _ => {},
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record() -> SignedRecord {
        SignedRecord {
            feed_name: "ETH/USD".into(),
            ois_title: "Nodary".into(),
            beacon_id: "0x01".into(),
            airnode: "0x02".into(),
            endpoint_id: "0x03".into(),
            template_id: "0x04".into(),
            parameters: "0x".into(),
            timestamp: "1".into(),
            encoded_value: "0x".into(),
            signature: "0x".into(),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(PoolError::malformed(MSG_BODY_NOT_JSON, "x").status_code(), 400);
        assert_eq!(PoolError::DuplicateKeys { unique: 1, total: 2 }.status_code(), 400);
        assert_eq!(PoolError::NotFound { key: "k".into() }.status_code(), 404);
        assert_eq!(PoolError::storage(MSG_SCAN, StorageError::timeout()).status_code(), 500);
        assert_eq!(PoolError::Internal("join".into()).status_code(), 500);
    }

    #[test]
    fn test_messages_and_details() {
        let err = PoolError::storage(MSG_WRITE, StorageError::connection("refused"));
        assert_eq!(err.message(), "Unable to send signed data to database");
        assert_eq!(err.detail().as_deref(), Some("Connection error: refused"));

        let err = PoolError::StaleTimestamp { stored: "5".into(), causing: None };
        assert_eq!(err.message(), "Request isn't updating the timestamp");
        assert_eq!(err.detail(), None);

        let err = PoolError::Internal("task panicked".into());
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_with_causing_attaches_record() {
        let err = PoolError::IdentifierMismatch { derived: B256::new([0; 32]), causing: None }
            .with_causing(&record());
        assert_eq!(err.causing(), Some(&record()));

        let err = PoolError::DuplicateKeys { unique: 1, total: 2 }.with_causing(&record());
        assert!(err.causing().is_none());
    }
}
