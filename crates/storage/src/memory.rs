//! In-memory storage backend implementation.
//!
//! [`MemoryBackend`] keeps every entry in a [`BTreeMap`] behind a
//! [`parking_lot::RwLock`]. It backs the test suites and local development
//! runs of the pool server.
//!
//! # Example
//!
//! ```
//! use signed_data_pool_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | set | O(log n) |
//! | delete | O(log n) |
//! | get_range | O(log n + k) where k is result size |
//!
//! Data is not persisted; everything is lost when the process exits.

use std::{
    collections::BTreeMap,
    ops::{Bound, RangeBounds},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    size_limits::{SizeLimits, validate_sizes},
    transaction::Transaction,
    types::KeyValue,
};

/// In-memory storage backend using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>,
    limits: SizeLimits,
}

impl MemoryBackend {
    /// Creates a new, empty in-memory backend with default size limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty in-memory backend enforcing the given limits.
    #[must_use]
    pub fn with_size_limits(limits: SizeLimits) -> Self {
        Self { data: Arc::default(), limits }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    #[tracing::instrument(skip(self, key, value), fields(key_len = key.len(), value_len = value.len()))]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        validate_sizes(&key, &value, &self.limits)?;
        let mut data = self.data.write();
        data.insert(key, Bytes::from(value));
        Ok(())
    }

    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        data.remove(key);
        Ok(())
    }

    #[tracing::instrument(skip(self, range))]
    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        let data = self.data.read();

        let start = match range.start_bound() {
            Bound::Included(b) => Bound::Included(b.as_slice()),
            Bound::Excluded(b) => Bound::Excluded(b.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };

        let end = match range.end_bound() {
            Bound::Included(b) => Bound::Included(b.as_slice()),
            Bound::Excluded(b) => Bound::Excluded(b.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };

        let results: Vec<KeyValue> = data
            .range::<[u8], _>((start, end))
            .map(|(k, v)| KeyValue::new(Bytes::copy_from_slice(k), v.clone()))
            .collect();

        Ok(results)
    }

    #[tracing::instrument(skip(self))]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction::new(self.clone())))
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        fail_point!("health-check", |_| Err(StorageError::connection("injected health failure")));
        // Lock acquisition proves we are not deadlocked.
        let _unused = self.data.read();
        Ok(())
    }
}

/// In-memory transaction implementation.
///
/// Buffers writes and deletes until commit, providing read-your-writes
/// semantics within the transaction.
struct MemoryTransaction {
    backend: MemoryBackend,
    pending_writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    fn new(backend: MemoryBackend) -> Self {
        Self { backend, pending_writes: BTreeMap::new() }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        if let Some(value) = self.pending_writes.get(key) {
            return Ok(value.as_ref().map(|v| Bytes::copy_from_slice(v)));
        }
        self.backend.get(key).await
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.pending_writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.pending_writes.insert(key, None);
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        // Validate everything before touching the map so a rejected entry
        // leaves the store untouched.
        for (key, value) in &self.pending_writes {
            match value {
                Some(v) => validate_sizes(key, v, &self.backend.limits)?,
                None => crate::size_limits::validate_key_size(key, &self.backend.limits)?,
            }
        }

        let mut data = self.backend.data.write();
        for (key, value) in self.pending_writes {
            match value {
                Some(v) => {
                    data.insert(key, Bytes::from(v));
                },
                None => {
                    data.remove(&key);
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let backend = MemoryBackend::new();

        backend.set(b"key1".to_vec(), b"value1".to_vec()).await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value1")));

        backend.delete(b"key1").await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_range_operations() {
        let backend = MemoryBackend::new();

        backend.set(b"a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"b".to_vec(), b"2".to_vec()).await.unwrap();
        backend.set(b"c".to_vec(), b"3".to_vec()).await.unwrap();

        let range = backend.get_range(b"a".to_vec()..b"c".to_vec()).await.unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].key, Bytes::from("a"));
        assert_eq!(range[1].key, Bytes::from("b"));
    }

    #[tokio::test]
    async fn test_prefix_scan_excludes_siblings() {
        let backend = MemoryBackend::new();

        backend.set(b"signed-data/0xaa/1".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"signed-data/0xaa/2".to_vec(), b"2".to_vec()).await.unwrap();
        backend.set(b"signed-data/0xab/1".to_vec(), b"3".to_vec()).await.unwrap();
        backend.set(b"beacon-index/0x01".to_vec(), b"4".to_vec()).await.unwrap();

        let partition = backend.get_prefix(b"signed-data/0xaa/").await.unwrap();
        assert_eq!(partition.len(), 2);

        let all = backend.get_prefix(b"signed-data/").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_transaction() {
        let backend = MemoryBackend::new();

        backend.set(b"key1".to_vec(), b"value1".to_vec()).await.unwrap();

        let mut txn = backend.transaction().await.unwrap();
        assert_eq!(txn.get(b"key1").await.unwrap(), Some(Bytes::from("value1")));

        txn.set(b"key2".to_vec(), b"value2".to_vec());
        assert_eq!(txn.get(b"key2").await.unwrap(), Some(Bytes::from("value2")));

        txn.delete(b"key1".to_vec());
        assert_eq!(txn.get(b"key1").await.unwrap(), None);

        // Nothing visible before commit.
        assert_eq!(backend.get(b"key2").await.unwrap(), None);

        txn.commit().await.unwrap();

        assert_eq!(backend.get(b"key1").await.unwrap(), None);
        assert_eq!(backend.get(b"key2").await.unwrap(), Some(Bytes::from("value2")));
    }

    #[tokio::test]
    async fn test_oversized_value_rejected() {
        let backend = MemoryBackend::with_size_limits(SizeLimits::new(16, 4).unwrap());
        let result = backend.set(b"k".to_vec(), b"too long".to_vec()).await;
        assert!(matches!(result, Err(StorageError::SizeLimitExceeded { kind: "value", .. })));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_transaction_applies_nothing() {
        let backend = MemoryBackend::with_size_limits(SizeLimits::new(16, 4).unwrap());

        let mut txn = backend.transaction().await.unwrap();
        txn.set(b"ok".to_vec(), b"1".to_vec());
        txn.set(b"bad".to_vec(), b"too long".to_vec());
        assert!(txn.commit().await.is_err());

        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = MemoryBackend::new();
        assert!(backend.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_clone_shares_data() {
        let backend1 = MemoryBackend::new();
        let backend2 = backend1.clone();

        backend1.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();

        assert_eq!(backend2.get(b"key").await.unwrap(), Some(Bytes::from("value")));
        assert_eq!(backend2.len(), 1);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_sorted_keys() -> impl Strategy<Value = Vec<Vec<u8>>> {
            proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..16), 0..30)
                .prop_map(|mut keys| {
                    keys.sort();
                    keys.dedup();
                    keys
                })
        }

        proptest! {
            /// Prefix scans return exactly the stored keys sharing the prefix, in order.
            #[test]
            fn prefix_scan_matches_filter(
                keys in arb_sorted_keys(),
                prefix in proptest::collection::vec(0u8..0xFF, 1..3),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");

                rt.block_on(async {
                    let backend = MemoryBackend::new();
                    for key in &keys {
                        backend.set(key.clone(), b"v".to_vec()).await.unwrap();
                    }

                    let results = backend.get_prefix(&prefix).await.unwrap();
                    let expected: Vec<&Vec<u8>> =
                        keys.iter().filter(|k| k.starts_with(&prefix)).collect();

                    prop_assert_eq!(results.len(), expected.len());
                    for (kv, key) in results.iter().zip(expected) {
                        prop_assert_eq!(kv.key.as_ref(), key.as_slice());
                    }

                    Ok(())
                })?;
            }
        }
    }
}
