//! Batch write operations for storage backends.
//!
//! [`BatchWriter`] accumulates write groups and flushes them as a series of
//! sub-batch transactions that respect configured operation and byte limits.
//! A *group* is a set of writes that must land together (a signed record and
//! its beacon index entry); groups are never split across sub-batches.
//!
//! # Examples
//!
//! ```
//! use signed_data_pool_storage::{MemoryBackend, batch::{BatchConfig, BatchWriter}};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! let mut writer = BatchWriter::new(backend, BatchConfig::default());
//!
//! writer.set(b"key1".to_vec(), b"value1".to_vec());
//! writer.set_group(vec![
//!     (b"record".to_vec(), b"{}".to_vec()),
//!     (b"index".to_vec(), b"record".to_vec()),
//! ]);
//!
//! let stats = writer.flush_all().await.unwrap();
//! assert_eq!(stats.groups_count, 2);
//! assert_eq!(stats.operations_count, 3);
//! # });
//! ```
//!
//! # Partial Failure
//!
//! Sub-batches commit independently. When one fails, the groups it carried
//! are reported as failed and later sub-batches still run, so the backend
//! may end up holding part of the batch. Writes are idempotent, so callers
//! recover by resubmitting the whole batch.
//!
//! With a [`BatchConfig::commit_timeout`] set, each sub-batch transaction is
//! bounded on its own. A sub-batch that runs past it fails with
//! [`StorageError::Timeout`] like any other failed commit.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use fail::fail_point;
use tracing::{debug, trace, warn};

use crate::{ConfigError, StorageBackend, StorageError, StorageResult};

/// Default maximum number of operations per sub-batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Default maximum byte size per sub-batch (1 MiB).
pub const DEFAULT_MAX_BATCH_BYTES: usize = 1024 * 1024;

/// Estimated per-operation encoding overhead in bytes.
const OPERATION_OVERHEAD_BYTES: usize = 50;

/// Configuration for batch writes.
///
/// # Validation
///
/// - `max_batch_size` must be `>= 1`
/// - `max_batch_bytes` must be `>= 1`
/// - `commit_timeout`, when set, must be non-zero
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub(crate) max_batch_size: usize,
    pub(crate) max_batch_bytes: usize,
    pub(crate) commit_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            commit_timeout: None,
        }
    }
}

#[bon::bon]
impl BatchConfig {
    /// Creates a new batch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_batch_size`, `max_batch_bytes`, or a
    /// supplied `commit_timeout` is zero.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_MAX_BATCH_SIZE)] max_batch_size: usize,
        #[builder(default = DEFAULT_MAX_BATCH_BYTES)] max_batch_bytes: usize,
        commit_timeout: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if max_batch_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_batch_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if max_batch_bytes == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_batch_bytes",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if commit_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::BelowMinimum {
                field: "commit_timeout",
                min: "1ms".into(),
                value: "0ms".into(),
            });
        }
        Ok(Self { max_batch_size, max_batch_bytes, commit_timeout })
    }

    /// Returns the maximum number of operations per sub-batch.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Returns the maximum byte size per sub-batch.
    #[must_use]
    pub fn max_batch_bytes(&self) -> usize {
        self.max_batch_bytes
    }

    /// Returns the bound on a single sub-batch transaction, if any.
    #[must_use]
    pub fn commit_timeout(&self) -> Option<Duration> {
        self.commit_timeout
    }
}

/// Single set operation in a batch.
#[derive(Debug, Clone)]
pub struct BatchOperation {
    /// The key to store.
    pub key: Vec<u8>,
    /// The value to associate with the key.
    pub value: Vec<u8>,
}

impl BatchOperation {
    /// Approximate encoded size of this operation in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.key.len() + self.value.len() + OPERATION_OVERHEAD_BYTES
    }
}

/// Writes that must be committed in the same sub-batch.
#[derive(Debug, Clone)]
struct WriteGroup {
    operations: Vec<BatchOperation>,
    size_bytes: usize,
}

/// Statistics from a batch flush operation.
#[derive(Debug, Clone, Default)]
pub struct BatchFlushStats {
    /// Number of groups flushed.
    pub groups_count: usize,
    /// Number of individual operations flushed.
    pub operations_count: usize,
    /// Number of groups that were committed.
    pub succeeded_count: usize,
    /// Number of groups whose sub-batch failed.
    pub failed_count: usize,
    /// Number of sub-batches created.
    pub batches_count: usize,
    /// Total estimated bytes written.
    pub total_bytes: usize,
    /// Time taken to flush.
    pub duration: Duration,
}

/// Result of a batch flush with per-group error reporting.
///
/// Entry `i` corresponds to the `i`-th group added to the writer. Groups that
/// shared a failed sub-batch share the same error via `Arc`.
#[derive(Debug, Clone)]
pub struct BatchResult {
    results: Vec<Result<(), Arc<StorageError>>>,
    stats: BatchFlushStats,
}

impl BatchResult {
    /// Returns the per-group results.
    #[must_use = "per-group results indicate which writes succeeded or failed"]
    pub fn results(&self) -> &[Result<(), Arc<StorageError>>] {
        &self.results
    }

    /// Returns the flush statistics.
    #[must_use]
    pub fn stats(&self) -> &BatchFlushStats {
        &self.stats
    }

    /// Returns `true` if any group failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.is_err())
    }

    /// Returns `true` if all groups were committed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.is_ok())
    }

    /// Returns the indices of failed groups.
    #[must_use]
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| if r.is_err() { Some(i) } else { None })
            .collect()
    }

    /// Collapses the per-group results into the first error, if any.
    ///
    /// When some groups were committed before the failure, the returned error
    /// is an [`StorageError::Internal`] that records the partial outcome and
    /// keeps the original failure as its source.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] encountered across all sub-batches.
    pub fn into_result(self) -> StorageResult<BatchFlushStats> {
        let mut first_err: Option<Arc<StorageError>> = None;
        for result in self.results {
            if let Err(e) = result
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }

        let Some(arc_err) = first_err else {
            return Ok(self.stats);
        };

        if self.stats.succeeded_count > 0 {
            return Err(StorageError::internal_with_source(
                format!(
                    "batch partially written: {} of {} groups committed",
                    self.stats.succeeded_count, self.stats.groups_count
                ),
                SharedStorageError(arc_err),
            ));
        }

        match Arc::try_unwrap(arc_err) {
            Ok(e) => Err(e),
            Err(shared) => Err(StorageError::internal_with_source(
                shared.to_string(),
                SharedStorageError(shared),
            )),
        }
    }
}

/// Adapter that lets an `Arc<StorageError>` act as an error source.
#[derive(Debug)]
struct SharedStorageError(Arc<StorageError>);

impl std::fmt::Display for SharedStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for SharedStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Accumulates write groups and flushes them in size-bounded sub-batches.
pub struct BatchWriter<B: StorageBackend> {
    backend: B,
    groups: Vec<WriteGroup>,
    current_size_bytes: usize,
    config: BatchConfig,
}

impl<B: StorageBackend> BatchWriter<B> {
    /// Creates a new batch writer backed by the given storage backend.
    #[must_use]
    pub fn new(backend: B, config: BatchConfig) -> Self {
        Self { backend, groups: Vec::new(), current_size_bytes: 0, config }
    }

    /// Adds a single set operation as its own group.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.set_group(vec![(key, value)]);
    }

    /// Adds a group of set operations that must be committed together.
    pub fn set_group(&mut self, pairs: Vec<(Vec<u8>, Vec<u8>)>) {
        let operations: Vec<BatchOperation> =
            pairs.into_iter().map(|(key, value)| BatchOperation { key, value }).collect();
        let size_bytes = operations.iter().map(BatchOperation::size_bytes).sum();
        self.current_size_bytes += size_bytes;
        self.groups.push(WriteGroup { operations, size_bytes });
    }

    /// Returns the number of pending groups.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.groups.len()
    }

    /// Splits pending groups into sub-batches, keeping original group indices.
    ///
    /// A group larger than either limit is placed in a sub-batch of its own;
    /// the backend decides whether to accept it.
    fn split_into_indexed_batches(&self) -> Vec<Vec<(usize, &WriteGroup)>> {
        let max_bytes = self.config.max_batch_bytes;
        let max_ops = self.config.max_batch_size;

        let mut batches = Vec::new();
        let mut current: Vec<(usize, &WriteGroup)> = Vec::new();
        let mut current_bytes = 0usize;
        let mut current_ops = 0usize;

        for (idx, group) in self.groups.iter().enumerate() {
            let group_ops = group.operations.len();
            let over_limit = current_bytes + group.size_bytes > max_bytes
                || current_ops + group_ops > max_ops;

            if over_limit && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_bytes = 0;
                current_ops = 0;
            }

            current.push((idx, group));
            current_bytes += group.size_bytes;
            current_ops += group_ops;
        }

        if !current.is_empty() {
            batches.push(current);
        }

        batches
    }

    /// Executes a single sub-batch, bounded by the commit timeout when set.
    async fn execute_batch(&self, entries: &[(usize, &WriteGroup)]) -> StorageResult<()> {
        match self.config.commit_timeout {
            Some(limit) => tokio::time::timeout(limit, self.commit_entries(entries))
                .await
                .unwrap_or_else(|_| Err(StorageError::timeout())),
            None => self.commit_entries(entries).await,
        }
    }

    async fn commit_entries(&self, entries: &[(usize, &WriteGroup)]) -> StorageResult<()> {
        let mut txn = self.backend.transaction().await?;

        for (_, group) in entries {
            for op in &group.operations {
                txn.set(op.key.clone(), op.value.clone());
            }
        }

        fail_point!("batch-before-commit", |_| {
            Err(StorageError::internal("injected failure before batch commit"))
        });
        txn.commit().await
    }

    /// Flushes all pending groups, returning the first error if any failed.
    ///
    /// # Errors
    ///
    /// See [`BatchResult::into_result`].
    #[must_use = "flush may fail and partial results must be handled"]
    pub async fn flush_all(&mut self) -> StorageResult<BatchFlushStats> {
        self.flush().await.into_result()
    }

    /// Flushes all pending groups with per-group error reporting.
    ///
    /// Each sub-batch commits in its own transaction. A failed sub-batch marks
    /// its groups as failed and processing continues with the next one.
    #[must_use = "flush results contain per-group errors that must be inspected"]
    pub async fn flush(&mut self) -> BatchResult {
        if self.groups.is_empty() {
            return BatchResult { results: Vec::new(), stats: BatchFlushStats::default() };
        }

        let start = Instant::now();
        let groups_count = self.groups.len();
        let operations_count = self.groups.iter().map(|g| g.operations.len()).sum();
        let total_bytes = self.current_size_bytes;

        let batches = self.split_into_indexed_batches();
        let batches_count = batches.len();

        debug!(
            groups = groups_count,
            operations = operations_count,
            bytes = total_bytes,
            batches = batches_count,
            "Flushing batch writes"
        );

        let mut results: Vec<Result<(), Arc<StorageError>>> = vec![Ok(()); groups_count];
        let mut succeeded_count = 0usize;
        let mut failed_count = 0usize;

        for (batch_idx, entries) in batches.iter().enumerate() {
            match self.execute_batch(entries).await {
                Ok(()) => {
                    succeeded_count += entries.len();
                    trace!(batch = batch_idx, groups = entries.len(), "Batch committed");
                },
                Err(e) => {
                    let arc_err = Arc::new(e);
                    warn!(batch = batch_idx, error = %arc_err, "Batch commit failed");
                    failed_count += entries.len();
                    for (idx, _) in entries {
                        results[*idx] = Err(Arc::clone(&arc_err));
                    }
                },
            }
        }
        drop(batches);

        self.groups.clear();
        self.current_size_bytes = 0;

        let stats = BatchFlushStats {
            groups_count,
            operations_count,
            succeeded_count,
            failed_count,
            batches_count,
            total_bytes,
            duration: start.elapsed(),
        };

        debug!(
            groups = stats.groups_count,
            succeeded = stats.succeeded_count,
            failed = stats.failed_count,
            batches = stats.batches_count,
            duration_ms = stats.duration.as_millis(),
            "Batch flush complete"
        );

        BatchResult { results, stats }
    }

    /// Clears all pending groups without flushing.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.current_size_bytes = 0;
    }
}
