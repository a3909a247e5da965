//! Common types used across storage operations.

use std::ops::Range;

use bytes::Bytes;

/// Key-value pair returned from range queries.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use signed_data_pool_storage::KeyValue;
///
/// let kv = KeyValue::new(Bytes::from("signed-data/0xabc/0xdef"), Bytes::from("{}"));
/// assert_eq!(kv.value, Bytes::from("{}"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key identifying this entry.
    pub key: Bytes,

    /// The value stored at this key.
    pub value: Bytes,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Returns the half-open key range covering every key that starts with `prefix`.
///
/// The end bound is the prefix with its last non-`0xFF` byte incremented and
/// everything after it dropped. A prefix made only of `0xFF` bytes (or an empty
/// prefix) has no finite successor, so the end bound becomes a single `0xFF`
/// repeated one byte past the prefix length, which still sorts after every key
/// the prefix can cover in practice.
///
/// # Examples
///
/// ```
/// use signed_data_pool_storage::prefix_range;
///
/// let range = prefix_range(b"signed-data/");
/// assert_eq!(range.start, b"signed-data/".to_vec());
/// assert_eq!(range.end, b"signed-data0".to_vec());
/// ```
#[must_use]
pub fn prefix_range(prefix: &[u8]) -> Range<Vec<u8>> {
    let start = prefix.to_vec();
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return start..end;
        }
    }
    start..vec![u8::MAX; prefix.len() + 1]
}
