//! Key-value storage abstraction for the signed data pool.
//!
//! This crate provides the [`StorageBackend`] trait that the record store
//! persists signed records through, together with an in-memory backend and a
//! batch writer for multi-record upserts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP handlers                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │              SignedDataService (upsert pipeline)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │        SignedDataStore (record keys, beacon index, JSON)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │       signed-data-pool-storage: StorageBackend trait        │
//! │     (get, set, delete, get_range, get_prefix, transaction)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       MemoryBackend                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use signed_data_pool_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"signed-data/0xaa/0x01".to_vec(), b"{}".to_vec()).await?;
//!
//!     let partition = backend.get_prefix(b"signed-data/0xaa/").await?;
//!     assert_eq!(partition.len(), 1);
//!
//!     let mut txn = backend.transaction().await?;
//!     txn.set(b"signed-data/0xaa/0x02".to_vec(), b"{}".to_vec());
//!     txn.set(b"beacon-index/0x03".to_vec(), b"signed-data/0xaa/0x02".to_vec());
//!     txn.commit().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Backends map their internal
//! failures to [`StorageError`] variants.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (a failure-injecting
//!   backend, assertion macros).
//! - **`failpoints`**: Activates `fail` injection points in batch commits and
//!   health checks.

#![deny(unsafe_code)]

pub mod backend;
pub mod batch;
pub mod error;
pub mod memory;
pub mod size_limits;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod transaction;
pub mod types;

pub use backend::StorageBackend;
pub use batch::{BatchConfig, BatchFlushStats, BatchOperation, BatchResult, BatchWriter};
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use size_limits::{
    DEFAULT_MAX_KEY_SIZE, DEFAULT_MAX_VALUE_SIZE, SizeLimits, validate_key_size, validate_sizes,
};
pub use transaction::Transaction;
pub use types::{KeyValue, prefix_range};
