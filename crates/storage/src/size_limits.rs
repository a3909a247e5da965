//! Key and value size validation for storage backends.
//!
//! Signed records are small (a few hundred bytes of hex), so anything far
//! larger is almost certainly abuse. Backends accept an optional
//! [`SizeLimits`] and call [`validate_sizes`] on every write path.
//!
//! | Limit | Default |
//! |-------|---------|
//! | `max_key_size` | 512 bytes |
//! | `max_value_size` | 65 536 bytes (64 KiB) |

use crate::{ConfigError, StorageError};

/// Default maximum key size in bytes (512 B).
pub const DEFAULT_MAX_KEY_SIZE: usize = 512;

/// Default maximum value size in bytes (64 KiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 64 * 1024;

/// Configurable size limits for keys and values.
///
/// # Example
///
/// ```
/// use signed_data_pool_storage::SizeLimits;
///
/// let limits = SizeLimits::new(256, 4096).unwrap();
/// assert_eq!(limits.max_key_size(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    max_key_size: usize,
    max_value_size: usize,
}

impl SizeLimits {
    /// Creates size limits with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either limit is zero.
    pub fn new(max_key_size: usize, max_value_size: usize) -> Result<Self, ConfigError> {
        if max_key_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_key_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if max_value_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_value_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        Ok(Self { max_key_size, max_value_size })
    }

    /// Returns the maximum allowed key size in bytes.
    #[must_use]
    pub fn max_key_size(&self) -> usize {
        self.max_key_size
    }

    /// Returns the maximum allowed value size in bytes.
    #[must_use]
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_key_size: DEFAULT_MAX_KEY_SIZE, max_value_size: DEFAULT_MAX_VALUE_SIZE }
    }
}

/// Validates that `key` fits within `limits`.
///
/// # Errors
///
/// Returns [`StorageError::SizeLimitExceeded`] when the key is too large.
pub fn validate_key_size(key: &[u8], limits: &SizeLimits) -> Result<(), StorageError> {
    if key.len() > limits.max_key_size {
        return Err(StorageError::SizeLimitExceeded {
            kind: "key",
            actual: key.len(),
            limit: limits.max_key_size,
        });
    }
    Ok(())
}

/// Validates both key and value against `limits`. The key is checked first.
///
/// # Errors
///
/// Returns [`StorageError::SizeLimitExceeded`] for the first oversized part.
pub fn validate_sizes(key: &[u8], value: &[u8], limits: &SizeLimits) -> Result<(), StorageError> {
    validate_key_size(key, limits)?;
    if value.len() > limits.max_value_size {
        return Err(StorageError::SizeLimitExceeded {
            kind: "value",
            actual: value.len(),
            limit: limits.max_value_size,
        });
    }
    Ok(())
}
