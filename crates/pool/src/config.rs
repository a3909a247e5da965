//! Configuration for the signed data pool.
//!
//! [`PoolConfig`] bounds batch fan-out, sizes the storage transactions used
//! for batch writes, and caps how long any single storage call may take.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use signed_data_pool_storage::{BatchConfig, ConfigError};

/// Default maximum number of records accepted in one batch request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Default number of records committed per storage transaction in a batch.
pub const DEFAULT_WRITE_CHUNK_RECORDS: usize = 25;

/// Default per-call storage timeout.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Storage writes per record: the record itself plus its beacon index entry.
pub(crate) const WRITES_PER_RECORD: usize = 2;

/// Configuration for [`SignedDataService`](crate::SignedDataService).
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use signed_data_pool::PoolConfig;
///
/// let config = PoolConfig::builder()
///     .max_batch_size(50)
///     .storage_timeout(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// assert_eq!(config.max_batch_size(), 50);
/// assert_eq!(config.write_chunk_records(), 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Maximum records per batch request; also bounds validation fan-out.
    #[serde(default = "default_max_batch_size")]
    pub(crate) max_batch_size: usize,

    /// Records committed per storage transaction during a batch write.
    #[serde(default = "default_write_chunk_records")]
    pub(crate) write_chunk_records: usize,

    /// Upper bound on any single storage call.
    #[serde(with = "humantime_serde", default = "default_storage_timeout")]
    pub(crate) storage_timeout: Duration,
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_write_chunk_records() -> usize {
    DEFAULT_WRITE_CHUNK_RECORDS
}

fn default_storage_timeout() -> Duration {
    DEFAULT_STORAGE_TIMEOUT
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            write_chunk_records: DEFAULT_WRITE_CHUNK_RECORDS,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

#[bon::bon]
impl PoolConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `max_batch_size` or
    /// `write_chunk_records` is zero, or `storage_timeout` is zero.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_MAX_BATCH_SIZE)] max_batch_size: usize,
        #[builder(default = DEFAULT_WRITE_CHUNK_RECORDS)] write_chunk_records: usize,
        #[builder(default = DEFAULT_STORAGE_TIMEOUT)] storage_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self { max_batch_size, write_chunk_records, storage_timeout };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configured values, e.g. after deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_batch_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if self.write_chunk_records == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "write_chunk_records",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if self.storage_timeout.is_zero() {
            return Err(ConfigError::BelowMinimum {
                field: "storage_timeout",
                min: "1ns".into(),
                value: "0s".into(),
            });
        }
        Ok(())
    }

    /// Returns the maximum number of records per batch.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Returns the number of records per storage transaction.
    #[must_use]
    pub fn write_chunk_records(&self) -> usize {
        self.write_chunk_records
    }

    /// Returns the per-call storage timeout.
    #[must_use]
    pub fn storage_timeout(&self) -> Duration {
        self.storage_timeout
    }

    /// Builds the storage batch configuration for chunked record writes.
    ///
    /// Each chunk transaction is bounded by the storage timeout.
    ///
    /// # Errors
    ///
    /// Propagates [`BatchConfig`] validation errors.
    pub fn batch_config(&self) -> Result<BatchConfig, ConfigError> {
        BatchConfig::builder()
            .max_batch_size(self.write_chunk_records.saturating_mul(WRITES_PER_RECORD))
            .commit_timeout(self.storage_timeout)
            .build()
    }
}
