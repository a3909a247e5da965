//! Transport-neutral HTTP responses.
//!
//! Handlers return an [`ApiResponse`]; the server converts it into its own
//! response type. Every response carries [`COMMON_HEADERS`].

use serde_json::{Map, Value, json};

use crate::{error::PoolError, record::SignedRecord};

/// Headers attached to every response.
pub const COMMON_HEADERS: &[(&str, &str)] = &[
    ("content-type", "application/json"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "*"),
];

/// A status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: &'static [(&'static str, &'static str)],
    pub body: Value,
}

impl ApiResponse {
    fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, headers: COMMON_HEADERS, body }
    }

    /// `201 { "count": n }` after a successful write.
    #[must_use]
    pub fn created(count: usize) -> Self {
        Self::new(201, json!({ "count": count }))
    }

    /// `200 { "count": n, "data": [...] }`.
    #[must_use]
    pub fn list(records: Vec<SignedRecord>) -> Self {
        Self::new(200, json!({ "count": records.len(), "data": records }))
    }

    /// `200` with the record itself as body.
    #[must_use]
    pub fn record(record: &SignedRecord) -> Self {
        Self::new(200, json!(record))
    }

    /// `200` when storage is reachable.
    #[must_use]
    pub fn healthy() -> Self {
        Self::new(200, json!({ "message": "OK" }))
    }

    /// Renders the body as a JSON string.
    #[must_use]
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

impl From<PoolError> for ApiResponse {
    fn from(error: PoolError) -> Self {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(error.message()));
        if let Some(detail) = error.detail() {
            body.insert("detail".into(), Value::String(detail));
        }
        if let Some(causing) = error.causing() {
            body.insert("causing".into(), json!(causing));
        }
        Self::new(error.status_code(), Value::Object(body))
    }
}
