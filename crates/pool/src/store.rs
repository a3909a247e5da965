//! Typed record store over a byte-level [`StorageBackend`].
//!
//! Records are stored as JSON under `signed-data/{airnode}/{templateId}`.
//! Each write also sets `beacon-index/{beaconId}` to the record's key in the
//! same transaction, so records can be fetched by derived beacon id.

use async_trait::async_trait;
use signed_data_pool_signing::{Address, B256};
use signed_data_pool_storage::{
    BatchConfig, BatchWriter, KeyValue, StorageBackend, StorageError, StorageResult,
};
use tracing::debug;

use crate::record::{RECORD_PREFIX, RecordKey, SignedRecord, beacon_index_key, partition_prefix};

/// Storage operations the pipeline needs, expressed in records.
#[async_trait]
pub trait SignedDataStore: Send + Sync + 'static {
    /// Returns the record stored under `key`, if any.
    async fn get(&self, key: &RecordKey) -> StorageResult<Option<SignedRecord>>;

    /// Returns the record whose derived beacon id is `beacon_id`, if any.
    async fn get_by_beacon_id(&self, beacon_id: &B256) -> StorageResult<Option<SignedRecord>>;

    /// Stores `record` under `key`, replacing any previous record.
    async fn put(&self, key: &RecordKey, record: &SignedRecord) -> StorageResult<()>;

    /// Stores many records in chunked transactions, each bounded on its own
    /// by the store's commit timeout. On error some records may have been
    /// written.
    async fn put_batch(&self, records: &[(RecordKey, SignedRecord)]) -> StorageResult<()>;

    /// Returns every record of one airnode, in key order.
    async fn list_partition(&self, airnode: &Address) -> StorageResult<Vec<SignedRecord>>;

    /// Returns every stored record, in key order.
    async fn scan(&self) -> StorageResult<Vec<SignedRecord>>;

    /// Verifies the underlying storage is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// [`SignedDataStore`] backed by any [`StorageBackend`].
#[derive(Clone)]
pub struct BackendSignedDataStore<B> {
    backend: B,
    batch: BatchConfig,
}

impl<B> BackendSignedDataStore<B>
where
    B: StorageBackend + Clone + 'static,
{
    /// Wraps `backend`; batch writes are chunked according to `batch`.
    #[must_use]
    pub fn new(backend: B, batch: BatchConfig) -> Self {
        Self { backend, batch }
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn encode(record: &SignedRecord) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| StorageError::serialization_with_source("failed to encode signed record", e))
}

fn decode(bytes: &[u8]) -> StorageResult<SignedRecord> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::serialization_with_source("failed to decode signed record", e))
}

fn decode_all(entries: Vec<KeyValue>) -> StorageResult<Vec<SignedRecord>> {
    entries.iter().map(|kv| decode(&kv.value)).collect()
}

/// The record write and its index write, which always land together.
fn write_group(key: &RecordKey, record: &SignedRecord) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let storage_key = key.storage_key();
    Ok(vec![
        (beacon_index_key(&key.beacon_id()), storage_key.clone()),
        (storage_key, encode(record)?),
    ])
}

#[async_trait]
impl<B> SignedDataStore for BackendSignedDataStore<B>
where
    B: StorageBackend + Clone + 'static,
{
    #[tracing::instrument(skip_all, fields(key = %key))]
    async fn get(&self, key: &RecordKey) -> StorageResult<Option<SignedRecord>> {
        match self.backend.get(&key.storage_key()).await? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, fields(beacon_id = %beacon_id))]
    async fn get_by_beacon_id(&self, beacon_id: &B256) -> StorageResult<Option<SignedRecord>> {
        let Some(storage_key) = self.backend.get(&beacon_index_key(beacon_id)).await? else {
            return Ok(None);
        };
        match self.backend.get(&storage_key).await? {
            Some(bytes) => decode(&bytes).map(Some),
            None => {
                debug!("beacon index points at a missing record");
                Ok(None)
            },
        }
    }

    #[tracing::instrument(skip_all, fields(key = %key))]
    async fn put(&self, key: &RecordKey, record: &SignedRecord) -> StorageResult<()> {
        let mut txn = self.backend.transaction().await?;
        for (k, v) in write_group(key, record)? {
            txn.set(k, v);
        }
        txn.commit().await
    }

    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    async fn put_batch(&self, records: &[(RecordKey, SignedRecord)]) -> StorageResult<()> {
        let mut writer = BatchWriter::new(self.backend.clone(), self.batch.clone());
        for (key, record) in records {
            writer.set_group(write_group(key, record)?);
        }
        writer.flush_all().await.map(|_| ())
    }

    #[tracing::instrument(skip_all, fields(airnode = %airnode))]
    async fn list_partition(&self, airnode: &Address) -> StorageResult<Vec<SignedRecord>> {
        decode_all(self.backend.get_prefix(partition_prefix(airnode).as_bytes()).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn scan(&self) -> StorageResult<Vec<SignedRecord>> {
        decode_all(self.backend.get_prefix(RECORD_PREFIX.as_bytes()).await?)
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use signed_data_pool_storage::MemoryBackend;

    use super::*;

    fn record(airnode_byte: u8, template_byte: u8) -> (RecordKey, SignedRecord) {
        let key = RecordKey::new(Address::new([airnode_byte; 20]), B256::new([template_byte; 32]));
        let record = SignedRecord {
            feed_name: "ETH/USD".into(),
            ois_title: "Nodary".into(),
            beacon_id: key.beacon_id().to_string(),
            airnode: key.airnode.to_string(),
            endpoint_id: B256::new([9; 32]).to_string(),
            template_id: key.template_id.to_string(),
            parameters: "0x".into(),
            timestamp: "1".into(),
            encoded_value: "0x".into(),
            signature: "0x".into(),
        };
        (key, record)
    }

    fn store() -> BackendSignedDataStore<MemoryBackend> {
        BackendSignedDataStore::new(MemoryBackend::new(), BatchConfig::default())
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let store = store();
        let (key, rec) = record(1, 2);

        store.put(&key, &rec).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(rec.clone()));
        assert_eq!(store.get_by_beacon_id(&key.beacon_id()).await.unwrap(), Some(rec));
        assert_eq!(store.backend().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_keys_are_none() {
        let store = store();
        let (key, _) = record(1, 2);
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert_eq!(store.get_by_beacon_id(&key.beacon_id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partition_and_scan() {
        let store = store();
        let records = vec![record(1, 1), record(1, 2), record(2, 1)];
        store.put_batch(&records).await.unwrap();

        assert_eq!(store.list_partition(&Address::new([1; 20])).await.unwrap().len(), 2);
        assert_eq!(store.list_partition(&Address::new([3; 20])).await.unwrap().len(), 0);
        // The beacon index is not part of a scan.
        assert_eq!(store.scan().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_put_batch_chunks_by_record() {
        let store = BackendSignedDataStore::new(
            MemoryBackend::new(),
            BatchConfig::builder().max_batch_size(2).build().unwrap(),
        );
        let records: Vec<_> = (0..5).map(|i| record(1, i)).collect();
        store.put_batch(&records).await.unwrap();

        assert_eq!(store.backend().len(), 10);
        for (key, rec) in &records {
            assert_eq!(store.get_by_beacon_id(&key.beacon_id()).await.unwrap().as_ref(), Some(rec));
        }
    }

    #[tokio::test]
    async fn test_corrupt_value_is_serialization_error() {
        let store = store();
        let (key, _) = record(1, 2);
        store.backend().set(key.storage_key(), b"not json".to_vec()).await.unwrap();

        assert!(matches!(store.get(&key).await, Err(StorageError::Serialization { .. })));
    }
}
