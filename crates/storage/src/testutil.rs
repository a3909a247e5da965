//! Shared test utilities for storage backend testing.
//!
//! Provides a failure-injecting backend wrapper and assertion macros for
//! [`StorageResult`] values. Gated behind the `testutil` feature.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! signed-data-pool-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use signed_data_pool_storage::testutil::FailingBackend;
//! ```

use std::{
    collections::{HashMap, HashSet},
    ops::RangeBounds,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    KeyValue, StorageBackend, Transaction,
    error::{StorageError, StorageResult},
    memory::MemoryBackend,
};

/// A [`MemoryBackend`] wrapper that injects failures.
///
/// - Commits whose zero-based transaction index is in `fail_commits` fail
///   with [`StorageError::Connection`] and apply nothing.
/// - While reads are failing, `get` and `get_range` fail the same way.
/// - Commits sleep before applying: every commit for the default delay, or
///   a chosen transaction index for its own delay.
///
/// Clones share counters and switches.
#[derive(Clone)]
pub struct FailingBackend {
    inner: MemoryBackend,
    transaction_count: Arc<AtomicUsize>,
    fail_commits: Arc<HashSet<usize>>,
    fail_reads: Arc<AtomicBool>,
    commit_delay: Option<Duration>,
    slow_commits: Arc<HashMap<usize, Duration>>,
}

impl FailingBackend {
    /// Wraps `inner`; no failures are injected until configured.
    #[must_use]
    pub fn new(inner: MemoryBackend) -> Self {
        Self::failing_commits(inner, HashSet::new())
    }

    /// Wraps `inner`, failing the commits at the given transaction indices.
    #[must_use]
    pub fn failing_commits(inner: MemoryBackend, fail_commits: HashSet<usize>) -> Self {
        Self {
            inner,
            transaction_count: Arc::new(AtomicUsize::new(0)),
            fail_commits: Arc::new(fail_commits),
            fail_reads: Arc::new(AtomicBool::new(false)),
            commit_delay: None,
            slow_commits: Arc::new(HashMap::new()),
        }
    }

    /// Delays every commit by `delay`.
    #[must_use]
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    /// Delays only the commit of transaction `idx` by `delay`.
    #[must_use]
    pub fn with_slow_commit(mut self, idx: usize, delay: Duration) -> Self {
        Arc::make_mut(&mut self.slow_commits).insert(idx, delay);
        self
    }

    /// Toggles read failures.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of transactions started so far.
    #[must_use]
    pub fn transactions_started(&self) -> usize {
        self.transaction_count.load(Ordering::SeqCst)
    }

    /// Returns the wrapped backend for direct inspection.
    #[must_use]
    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    fn check_reads(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::connection("simulated read failure"));
        }
        Ok(())
    }
}

/// Transaction wrapper that conditionally delays or fails on commit.
struct FailingTransaction {
    inner: std::sync::Mutex<Box<dyn Transaction>>,
    should_fail: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl Transaction for FailingTransaction {
    async fn get(&self, _key: &[u8]) -> StorageResult<Option<Bytes>> {
        Err(StorageError::internal("get not supported on FailingTransaction"))
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.get_mut().expect("lock poisoned").set(key, value);
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.inner.get_mut().expect("lock poisoned").delete(key);
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            Err(StorageError::connection("simulated commit failure"))
        } else {
            self.inner.into_inner().expect("lock poisoned").commit().await
        }
    }
}

#[async_trait]
impl StorageBackend for FailingBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.check_reads()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        self.check_reads()?;
        self.inner.get_range(range).await
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        let idx = self.transaction_count.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.transaction().await?;
        Ok(Box::new(FailingTransaction {
            inner: std::sync::Mutex::new(inner),
            should_fail: self.fail_commits.contains(&idx),
            delay: self.slow_commits.get(&idx).copied().or(self.commit_delay),
        }))
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.check_reads()?;
        self.inner.health_check().await
    }
}

/// Asserts that a [`StorageResult`] is a [`StorageError::NotFound`].
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::NotFound { .. })),
            "expected StorageError::NotFound, got: {:?}",
            $result,
        );
    };
}

/// Asserts that a [`StorageResult`] is `Ok` and returns the inner value.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_backend_fails_selected_commit() {
        let backend = FailingBackend::failing_commits(MemoryBackend::new(), HashSet::from([1]));

        let mut first = backend.transaction().await.expect("txn");
        first.set(b"a".to_vec(), b"1".to_vec());
        assert!(first.commit().await.is_ok());

        let mut second = backend.transaction().await.expect("txn");
        second.set(b"b".to_vec(), b"2".to_vec());
        assert!(matches!(second.commit().await, Err(StorageError::Connection { .. })));

        assert_eq!(backend.transactions_started(), 2);
        assert_eq!(backend.inner().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_backend_read_switch() {
        let backend = FailingBackend::new(MemoryBackend::new());
        backend.set_fail_reads(true);
        assert!(backend.get(b"k").await.is_err());
        assert!(backend.get_prefix(b"k").await.is_err());

        backend.set_fail_reads(false);
        assert_eq!(assert_storage_ok!(backend.get(b"k").await), None);
    }

    #[tokio::test]
    async fn test_slow_commit_applies_after_delay() {
        let backend = FailingBackend::new(MemoryBackend::new())
            .with_slow_commit(0, Duration::from_millis(20));

        let mut txn = backend.transaction().await.expect("txn");
        txn.set(b"a".to_vec(), b"1".to_vec());
        let start = std::time::Instant::now();
        assert_storage_ok!(txn.commit().await, "delayed commit");
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(backend.inner().len(), 1);
    }

    #[test]
    fn test_assert_not_found_macro() {
        let result: StorageResult<()> = Err(StorageError::not_found("missing"));
        assert_not_found!(result);
    }
}
