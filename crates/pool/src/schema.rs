//! Structural validation of request bodies.
//!
//! Checks run field by field in schema order and stop at the first problem.
//! No cryptographic or storage work happens here. Unknown fields are dropped.

use std::fmt;

use serde_json::{Map, Value};
use signed_data_pool_signing::validation::{is_evm_address, is_evm_id};

use crate::record::SignedRecord;

/// First structural problem found in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Location of the problem, e.g. `airnode` or `[2].signature`.
    pub path: String,
    /// What was wrong.
    pub reason: String,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }

    fn at_index(self, index: usize) -> Self {
        let path = if self.path.is_empty() {
            format!("[{index}]")
        } else {
            format!("[{index}].{}", self.path)
        };
        Self { path, reason: self.reason }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

#[derive(Clone, Copy)]
enum Format {
    Text,
    EvmAddress,
    EvmId,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates one signed record.
///
/// # Errors
///
/// Returns the first [`SchemaViolation`]: a non-object body, a missing or
/// non-string field, or an id/address field with the wrong hex shape.
pub fn validate_record(raw: &Value) -> Result<SignedRecord, SchemaViolation> {
    let Value::Object(map) = raw else {
        return Err(SchemaViolation::new("", format!("Expected object, received {}", type_name(raw))));
    };

    // Struct fields evaluate in wire order, so the first bad field wins.
    Ok(SignedRecord {
        feed_name: field(map, "feedName", Format::Text)?,
        ois_title: field(map, "oisTitle", Format::Text)?,
        beacon_id: field(map, "beaconId", Format::EvmId)?,
        airnode: field(map, "airnode", Format::EvmAddress)?,
        endpoint_id: field(map, "endpointId", Format::EvmId)?,
        template_id: field(map, "templateId", Format::EvmId)?,
        parameters: field(map, "parameters", Format::Text)?,
        timestamp: field(map, "timestamp", Format::Text)?,
        encoded_value: field(map, "encodedValue", Format::Text)?,
        signature: field(map, "signature", Format::Text)?,
    })
}

fn field(map: &Map<String, Value>, name: &str, format: Format) -> Result<String, SchemaViolation> {
    let value = match map.get(name) {
        None => return Err(SchemaViolation::new(name, "Required")),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(SchemaViolation::new(
                name,
                format!("Expected string, received {}", type_name(other)),
            ));
        },
    };
    let well_formed = match format {
        Format::Text => true,
        Format::EvmAddress => is_evm_address(value),
        Format::EvmId => is_evm_id(value),
    };
    if !well_formed {
        return Err(SchemaViolation::new(name, "Invalid"));
    }
    Ok(value.clone())
}

/// Validates a batch: a non-empty array of at most `max_batch_size` records,
/// every one of which passes [`validate_record`].
///
/// # Errors
///
/// Returns the first [`SchemaViolation`], with element paths prefixed by
/// their index.
pub fn validate_batch(
    raw: &Value,
    max_batch_size: usize,
) -> Result<Vec<SignedRecord>, SchemaViolation> {
    let Value::Array(items) = raw else {
        return Err(SchemaViolation::new("", format!("Expected array, received {}", type_name(raw))));
    };
    if items.is_empty() {
        return Err(SchemaViolation::new("", "Array must contain at least 1 element(s)"));
    }
    if items.len() > max_batch_size {
        return Err(SchemaViolation::new(
            "",
            format!("Array must contain at most {max_batch_size} element(s), received {}", items.len()),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_record(item).map_err(|v| v.at_index(i)))
        .collect()
}
