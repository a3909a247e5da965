//! Upsert orchestration and retrieval.
//!
//! [`SignedDataService`] owns an injected [`SignedDataStore`] and sequences
//! validation, freshness reads, and writes.
//!
//! # Batch phases
//!
//! | Phase | Work | On failure |
//! |-------|------|------------|
//! | 1 | duplicate `(airnode, templateId)` detection | `DuplicateKeys` |
//! | 2 | signature and beacon id, one task per record | first failure by input order |
//! | 3 | freshness read, one task per record | first failure by input order |
//! | 4 | chunked batch write | `StorageUnavailable`, state may be partial |
//!
//! Nothing is written unless phases 1 to 3 pass for every record. Phase 4
//! does not roll back; chunks committed before a failure stay written.
//!
//! Every storage call is bounded by the storage timeout, except phase 4. Its
//! chunks are bounded one by one by the store, so a large batch never times
//! out as a whole and a slow chunk reports which part was written.
//!
//! Freshness is read-then-write, not compare-and-swap. Two concurrent writers
//! of the same key can both pass phase 3, and the later storage write wins.

use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use signed_data_pool_signing::{Address, B256};
use signed_data_pool_storage::{StorageError, StorageResult};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    config::PoolConfig,
    error::{
        MSG_BATCH_SCHEMA, MSG_BATCH_WRITE, MSG_HEALTH, MSG_READ, MSG_READ_FOR_FRESHNESS, MSG_SCAN,
        MSG_WRITE, PoolError,
    },
    pipeline::{check_freshness, verify_record},
    record::{RecordKey, SignedRecord},
    store::SignedDataStore,
};

/// Runs a storage call, failing with [`StorageError::Timeout`] after `limit`.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| Err(StorageError::timeout()))
}

/// Joins every task and returns the outcomes in input order. The first
/// failure by input index wins and has its record attached.
async fn join_in_order<T: 'static>(
    mut tasks: JoinSet<(usize, Result<T, PoolError>)>,
    records: &[SignedRecord],
) -> Result<Vec<T>, PoolError> {
    let mut slots: Vec<Option<Result<T, PoolError>>> = records.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (idx, outcome) =
            joined.map_err(|e| PoolError::Internal(format!("validation task failed: {e}")))?;
        slots[idx] = Some(outcome);
    }

    let mut values = Vec::with_capacity(records.len());
    for (idx, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(value)) => values.push(value),
            Some(Err(e)) => {
                debug!(index = idx, reason = %e, "Rejected batch");
                return Err(e.with_causing(&records[idx]));
            },
            None => return Err(PoolError::Internal(format!("no result for record {idx}"))),
        }
    }
    Ok(values)
}

/// The signed data pool: validates candidates and persists the latest record
/// per `(airnode, templateId)`.
pub struct SignedDataService<S> {
    store: Arc<S>,
    config: PoolConfig,
}

impl<S> Clone for SignedDataService<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), config: self.config.clone() }
    }
}

impl<S: SignedDataStore> SignedDataService<S> {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: S, config: PoolConfig) -> Self {
        Self { store: Arc::new(store), config }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores one schema-checked record.
    ///
    /// # Errors
    ///
    /// Returns the first failing check; nothing is written in that case.
    #[tracing::instrument(skip_all, fields(airnode = %record.airnode, template_id = %record.template_id))]
    pub async fn upsert(&self, record: SignedRecord) -> Result<(), PoolError> {
        let key = verify_record(&record).inspect_err(|e| debug!(reason = %e, "Rejected record"))?;

        let stored = bounded(self.config.storage_timeout, self.store.get(&key))
            .await
            .map_err(|e| PoolError::storage(MSG_READ_FOR_FRESHNESS, e))?;
        check_freshness(&record, stored.as_ref())
            .inspect_err(|e| debug!(reason = %e, "Rejected record"))?;

        bounded(self.config.storage_timeout, self.store.put(&key, &record)).await.map_err(|e| {
            warn!(error = %e, "Failed to write signed record");
            PoolError::storage(MSG_WRITE, e)
        })?;

        info!(timestamp = %record.timestamp, "Stored signed record");
        Ok(())
    }

    /// Validates and stores a schema-checked batch, all or nothing up to the
    /// final write. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateKeys`], the first failing record's
    /// validation error (with the record attached), or
    /// [`PoolError::StorageUnavailable`] from the write.
    #[tracing::instrument(skip_all, fields(count = records.len()))]
    pub async fn batch_upsert(&self, records: Vec<SignedRecord>) -> Result<usize, PoolError> {
        let total = records.len();
        if total > self.config.max_batch_size {
            return Err(PoolError::malformed(
                MSG_BATCH_SCHEMA,
                format!("batch of {total} exceeds maximum of {}", self.config.max_batch_size),
            ));
        }

        // Phase 1: duplicates
        let mut unique = HashSet::with_capacity(total);
        for record in &records {
            let key =
                record.key().map_err(|e| PoolError::malformed(MSG_BATCH_SCHEMA, e.to_string()))?;
            unique.insert(key);
        }
        if unique.len() < total {
            debug!(unique = unique.len(), total, "Rejected batch with duplicate keys");
            return Err(PoolError::DuplicateKeys { unique: unique.len(), total });
        }

        let records: Arc<[SignedRecord]> = records.into();

        // Phase 2: signature and beacon id
        let mut tasks = JoinSet::new();
        for idx in 0..total {
            let records = Arc::clone(&records);
            tasks.spawn(async move { (idx, verify_record(&records[idx])) });
        }
        let keys = join_in_order(tasks, &records).await?;

        // Phase 3: freshness
        let mut tasks = JoinSet::new();
        for (idx, key) in keys.iter().copied().enumerate() {
            let records = Arc::clone(&records);
            let store = Arc::clone(&self.store);
            let limit = self.config.storage_timeout;
            tasks.spawn(async move {
                let outcome = match bounded(limit, store.get(&key)).await {
                    Ok(stored) => check_freshness(&records[idx], stored.as_ref()),
                    Err(e) => Err(PoolError::storage(MSG_READ_FOR_FRESHNESS, e)),
                };
                (idx, outcome)
            });
        }
        join_in_order(tasks, &records).await?;

        // Phase 4: write
        let entries: Vec<(RecordKey, SignedRecord)> =
            keys.into_iter().zip(records.iter().cloned()).collect();
        self.store.put_batch(&entries).await.map_err(|e| {
            warn!(error = %e, count = total, "Failed to write signed record batch");
            PoolError::storage(MSG_BATCH_WRITE, e)
        })?;

        info!(count = total, "Stored signed record batch");
        Ok(total)
    }

    /// Returns the record stored under `key`.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotFound`] on a miss, [`PoolError::StorageUnavailable`]
    /// if the read fails.
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn get_record(&self, key: &RecordKey) -> Result<SignedRecord, PoolError> {
        bounded(self.config.storage_timeout, self.store.get(key))
            .await
            .map_err(|e| PoolError::storage(MSG_READ, e))?
            .ok_or_else(|| PoolError::NotFound { key: key.to_string() })
    }

    /// Returns the record whose derived beacon id is `beacon_id`.
    ///
    /// # Errors
    ///
    /// [`PoolError::NotFound`] on a miss, [`PoolError::StorageUnavailable`]
    /// if the read fails.
    #[tracing::instrument(skip(self), fields(beacon_id = %beacon_id))]
    pub async fn get_by_beacon_id(&self, beacon_id: &B256) -> Result<SignedRecord, PoolError> {
        bounded(self.config.storage_timeout, self.store.get_by_beacon_id(beacon_id))
            .await
            .map_err(|e| PoolError::storage(MSG_READ, e))?
            .ok_or_else(|| PoolError::NotFound { key: beacon_id.to_string() })
    }

    /// Returns every record of one airnode.
    ///
    /// # Errors
    ///
    /// [`PoolError::StorageUnavailable`] if the read fails.
    #[tracing::instrument(skip(self), fields(airnode = %airnode))]
    pub async fn list_by_airnode(&self, airnode: &Address) -> Result<Vec<SignedRecord>, PoolError> {
        bounded(self.config.storage_timeout, self.store.list_partition(airnode))
            .await
            .map_err(|e| PoolError::storage(MSG_READ, e))
    }

    /// Returns every stored record.
    ///
    /// # Errors
    ///
    /// [`PoolError::StorageUnavailable`] if the scan fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<SignedRecord>, PoolError> {
        bounded(self.config.storage_timeout, self.store.scan())
            .await
            .map_err(|e| PoolError::storage(MSG_SCAN, e))
    }

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// [`PoolError::StorageUnavailable`] if the health check fails.
    pub async fn health(&self) -> Result<(), PoolError> {
        bounded(self.config.storage_timeout, self.store.health_check())
            .await
            .map_err(|e| PoolError::storage(MSG_HEALTH, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use signed_data_pool_signing::testutil::TestWallet;

    use super::*;
    use crate::testutil::{fixture_record, memory_service, signed_record};

    #[tokio::test]
    async fn test_upsert_then_read_back() {
        let service = memory_service(PoolConfig::default());
        let record = fixture_record();

        service.upsert(record.clone()).await.unwrap();

        let key = record.key().unwrap();
        assert_eq!(service.get_record(&key).await.unwrap(), record);
        assert_eq!(service.get_by_beacon_id(&key.beacon_id()).await.unwrap(), record);
        assert_eq!(service.list_by_airnode(&key.airnode).await.unwrap(), vec![record.clone()]);
        assert_eq!(service.list_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_resubmit_is_stale() {
        let service = memory_service(PoolConfig::default());
        service.upsert(fixture_record()).await.unwrap();

        let err = service.upsert(fixture_record()).await.unwrap_err();
        assert!(matches!(err, PoolError::StaleTimestamp { causing: None, .. }));
    }

    #[tokio::test]
    async fn test_newer_record_replaces_older() {
        let service = memory_service(PoolConfig::default());
        let wallet = TestWallet::random();

        service.upsert(signed_record(&wallet, 1, "100", 5)).await.unwrap();
        let newer = signed_record(&wallet, 1, "101", 6);
        service.upsert(newer.clone()).await.unwrap();

        assert_eq!(service.get_record(&newer.key().unwrap()).await.unwrap(), newer);
        assert_eq!(service.store().backend().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let service = memory_service(PoolConfig::default());
        let key = fixture_record().key().unwrap();
        assert!(matches!(service.get_record(&key).await, Err(PoolError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_batch_writes_every_record() {
        let service = memory_service(PoolConfig::default());
        let wallet = TestWallet::random();
        let batch: Vec<_> = (0..4).map(|i| signed_record(&wallet, i, "100", 1)).collect();

        assert_eq!(service.batch_upsert(batch).await.unwrap(), 4);
        assert_eq!(service.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_batch_duplicates_rejected_without_causing() {
        let service = memory_service(PoolConfig::default());
        let wallet = TestWallet::random();
        let batch = vec![
            signed_record(&wallet, 1, "100", 1),
            signed_record(&wallet, 2, "100", 1),
            signed_record(&wallet, 1, "101", 1),
        ];

        let err = service.batch_upsert(batch).await.unwrap_err();
        assert!(matches!(err, PoolError::DuplicateKeys { unique: 2, total: 3 }));
        assert!(err.causing().is_none());
        assert!(service.store().backend().is_empty());
    }

    #[tokio::test]
    async fn test_batch_first_failure_by_input_order() {
        let service = memory_service(PoolConfig::default());
        let wallet = TestWallet::random();
        let mut batch: Vec<_> = (0..5).map(|i| signed_record(&wallet, i, "100", 1)).collect();
        batch[2].encoded_value = "0x01".into();
        batch[4].beacon_id = B256::new([0; 32]).to_string();

        let err = service.batch_upsert(batch.clone()).await.unwrap_err();
        assert!(matches!(err, PoolError::SignatureMismatch { .. }));
        assert_eq!(err.causing(), Some(&batch[2]));
        assert!(service.store().backend().is_empty());
    }

    #[tokio::test]
    async fn test_batch_stale_member_rejects_whole_batch() {
        let service = memory_service(PoolConfig::default());
        let wallet = TestWallet::random();
        service.upsert(signed_record(&wallet, 1, "200", 1)).await.unwrap();

        let batch = vec![signed_record(&wallet, 0, "300", 1), signed_record(&wallet, 1, "150", 1)];
        let err = service.batch_upsert(batch.clone()).await.unwrap_err();

        assert!(matches!(err, PoolError::StaleTimestamp { .. }));
        assert_eq!(err.causing(), Some(&batch[1]));
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_over_limit_is_malformed() {
        let config = PoolConfig::builder().max_batch_size(2).build().unwrap();
        let service = memory_service(config);
        let wallet = TestWallet::random();
        let batch: Vec<_> = (0..3).map(|i| signed_record(&wallet, i, "1", 1)).collect();

        let err = service.batch_upsert(batch).await.unwrap_err();
        assert_eq!(err.message(), MSG_BATCH_SCHEMA);
    }

    #[tokio::test]
    async fn test_health_reports_reachable_store() {
        let service = memory_service(PoolConfig::default());
        service.health().await.unwrap();
    }
}
