//! Per-record validation steps.
//!
//! A candidate record passes three checks, in order:
//!
//! 1. [`verify_signature`]: the signature over
//!    `(templateId, timestamp, encodedValue)` recovers to `airnode`
//! 2. [`verify_beacon_id`]: `beaconId` equals `keccak256(airnode ‖ templateId)`
//! 3. [`check_freshness`]: the candidate is strictly newer than what is stored
//!
//! Steps 1 and 2 are pure and run without storage access.

use signed_data_pool_signing::{
    Address, B256, SigningError, build_digest, decode_hex, derive_beacon_id, recover_signer,
    uint256_from_decimal,
};
use signed_data_pool_storage::StorageError;

use crate::{
    error::{MSG_READ_FOR_FRESHNESS, PoolError},
    record::{RecordKey, SignedRecord},
};

fn recovery_error(source: SigningError) -> PoolError {
    PoolError::SignatureRecovery { source, causing: None }
}

fn derivation_error(source: SigningError) -> PoolError {
    PoolError::Derivation { source, causing: None }
}

/// Checks that the record's signature was produced by its airnode.
///
/// An empty `encodedValue` signs as zero bytes.
///
/// # Errors
///
/// - [`PoolError::SignatureRecovery`] if the template id, timestamp, value or
///   signature cannot be decoded, or no signer can be recovered
/// - [`PoolError::SignatureMismatch`] if the recovered signer differs from
///   `airnode`
pub fn verify_signature(record: &SignedRecord) -> Result<Address, PoolError> {
    let template_id: B256 = record.template_id.parse().map_err(recovery_error)?;
    let payload = if record.encoded_value.is_empty() {
        Vec::new()
    } else {
        decode_hex(&record.encoded_value).map_err(recovery_error)?
    };

    let digest = build_digest(&template_id, &record.timestamp, &payload).map_err(recovery_error)?;
    let recovered = recover_signer(&digest, &record.signature).map_err(recovery_error)?;

    let airnode: Address = record.airnode.parse().map_err(recovery_error)?;
    if recovered != airnode {
        return Err(PoolError::SignatureMismatch { recovered, causing: None });
    }
    Ok(recovered)
}

/// Checks that `beaconId` is the id derived from `airnode` and `templateId`,
/// returning the record's storage key.
///
/// # Errors
///
/// - [`PoolError::Derivation`] if airnode or template id cannot be decoded
/// - [`PoolError::IdentifierMismatch`] if the submitted id differs
pub fn verify_beacon_id(record: &SignedRecord) -> Result<RecordKey, PoolError> {
    let key = record.key().map_err(derivation_error)?;
    let derived = derive_beacon_id(&key.airnode, &key.template_id);

    let matches = record.beacon_id.parse::<B256>().is_ok_and(|submitted| submitted == derived);
    if !matches {
        return Err(PoolError::IdentifierMismatch { derived, causing: None });
    }
    Ok(key)
}

/// Runs the storage-free steps (signature, then beacon id).
///
/// # Errors
///
/// Returns the first failing step's error.
pub fn verify_record(record: &SignedRecord) -> Result<RecordKey, PoolError> {
    verify_signature(record)?;
    verify_beacon_id(record)
}

/// Checks that `candidate` is strictly newer than `stored`. Absence of a
/// stored record always passes.
///
/// # Errors
///
/// - [`PoolError::StaleTimestamp`] if `candidate.timestamp <= stored.timestamp`
/// - [`PoolError::SignatureRecovery`] if the candidate timestamp is not a
///   decimal integer
/// - [`PoolError::StorageUnavailable`] if the stored timestamp is corrupt
pub fn check_freshness(
    candidate: &SignedRecord,
    stored: Option<&SignedRecord>,
) -> Result<(), PoolError> {
    let Some(stored) = stored else {
        return Ok(());
    };

    let candidate_ts = uint256_from_decimal(&candidate.timestamp).map_err(recovery_error)?;
    let stored_ts = uint256_from_decimal(&stored.timestamp).map_err(|e| {
        PoolError::storage(
            MSG_READ_FOR_FRESHNESS,
            StorageError::serialization_with_source("stored timestamp is not a decimal integer", e),
        )
    })?;

    if candidate_ts <= stored_ts {
        return Err(PoolError::StaleTimestamp { stored: stored.timestamp.clone(), causing: None });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;
    use signed_data_pool_signing::testutil::*;

    use super::*;

    fn fixture() -> SignedRecord {
        SignedRecord {
            feed_name: FIXTURE_FEED_NAME.into(),
            ois_title: FIXTURE_OIS_TITLE.into(),
            beacon_id: FIXTURE_BEACON_ID.into(),
            airnode: FIXTURE_AIRNODE.into(),
            endpoint_id: FIXTURE_ENDPOINT_ID.into(),
            template_id: FIXTURE_TEMPLATE_ID.into(),
            parameters: FIXTURE_PARAMETERS.into(),
            timestamp: FIXTURE_TIMESTAMP.into(),
            encoded_value: FIXTURE_ENCODED_VALUE.into(),
            signature: FIXTURE_SIGNATURE.into(),
        }
    }

    fn with_timestamp(timestamp: &str) -> SignedRecord {
        SignedRecord { timestamp: timestamp.to_owned(), ..fixture() }
    }

    #[test]
    fn test_fixture_passes_storage_free_steps() {
        let key = verify_record(&fixture()).unwrap();
        assert_eq!(key.beacon_id().to_string(), FIXTURE_BEACON_ID);
    }

    #[test]
    fn test_lowercase_airnode_still_matches() {
        let record = SignedRecord { airnode: FIXTURE_AIRNODE.to_lowercase(), ..fixture() };
        assert!(verify_record(&record).is_ok());
    }

    #[test]
    fn test_other_airnode_is_mismatch() {
        let record =
            SignedRecord { airnode: "0x0000000000000000000000000000000000000001".into(), ..fixture() };
        let err = verify_signature(&record).unwrap_err();
        assert!(matches!(err, PoolError::SignatureMismatch { .. }), "got {err:?}");
    }

    #[test]
    fn test_truncated_signature_is_recovery_error() {
        let record = SignedRecord { signature: "0x2adf".into(), ..fixture() };
        assert!(matches!(verify_signature(&record), Err(PoolError::SignatureRecovery { .. })));
    }

    #[test]
    fn test_non_decimal_timestamp_is_recovery_error() {
        assert!(matches!(
            verify_signature(&with_timestamp("soon")),
            Err(PoolError::SignatureRecovery { source: SigningError::InvalidInteger(_), .. })
        ));
    }

    #[test]
    fn test_wrong_beacon_id_is_mismatch() {
        let record = SignedRecord {
            beacon_id: "0x0000000000000000000000000000000000000000000000000000000000000000".into(),
            ..fixture()
        };
        let err = verify_beacon_id(&record).unwrap_err();
        match err {
            PoolError::IdentifierMismatch { derived, .. } => {
                assert_eq!(derived.to_string(), FIXTURE_BEACON_ID);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_freshness_without_stored_record() {
        assert!(check_freshness(&fixture(), None).is_ok());
    }

    #[test]
    fn test_equal_timestamp_is_stale() {
        let stored = fixture();
        assert!(matches!(
            check_freshness(&fixture(), Some(&stored)),
            Err(PoolError::StaleTimestamp { .. })
        ));
    }

    #[test]
    fn test_numeric_not_lexicographic_comparison() {
        let stored = with_timestamp("9");
        assert!(check_freshness(&with_timestamp("10"), Some(&stored)).is_ok());
    }

    #[test]
    fn test_corrupt_stored_timestamp_is_storage_error() {
        let stored = with_timestamp("not-a-number");
        let err = check_freshness(&fixture(), Some(&stored)).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), MSG_READ_FOR_FRESHNESS);
    }

    proptest! {
        #[test]
        fn freshness_accepts_only_strictly_newer(stored in any::<u64>(), candidate in any::<u64>()) {
            let result = check_freshness(
                &with_timestamp(&candidate.to_string()),
                Some(&with_timestamp(&stored.to_string())),
            );
            if candidate > stored {
                prop_assert!(result.is_ok());
            } else {
                let is_stale = matches!(result, Err(PoolError::StaleTimestamp { .. }));
                prop_assert!(is_stale);
            }
        }
    }
}
