//! Transaction trait for atomic storage operations.
//!
//! Transactions buffer writes until [`Transaction::commit`], then apply them
//! together. The record store uses them to write a signed record and its beacon
//! index entry as one unit, and [`BatchWriter`](crate::BatchWriter) commits
//! each sub-batch through one.
//!
//! # Example
//!
//! ```
//! use signed_data_pool_storage::{MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! txn.set(b"signed-data/a/b".to_vec(), b"{}".to_vec());
//! txn.set(b"beacon-index/c".to_vec(), b"signed-data/a/b".to_vec());
//! txn.commit().await.unwrap();
//!
//! assert!(backend.get(b"beacon-index/c").await.unwrap().is_some());
//! # });
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Transaction handle for atomic multi-operation commits.
///
/// Reads through [`get`](Transaction::get) observe the transaction's own
/// pending writes before falling back to the backend.
#[async_trait]
pub trait Transaction: Send {
    /// Gets a value within the transaction, honouring pending writes.
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Buffers a set operation.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Buffers a delete operation.
    fn delete(&mut self, key: Vec<u8>);

    /// Applies all buffered operations atomically, consuming the transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`](crate::StorageError) if the backend rejects
    /// the commit. No buffered operation is applied in that case.
    async fn commit(self: Box<Self>) -> StorageResult<()>;
}
