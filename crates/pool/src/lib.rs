//! Validation and upsert pipeline for signed oracle data.
//!
//! Airnodes submit signed data points. The pool verifies each one against its
//! signer and beacon id, rejects anything not strictly newer than what it
//! already holds, and keeps the latest record per `(airnode, templateId)`.
//!
//! # Pipeline
//!
//! ```text
//! body ─► parse JSON ─► schema ─► signature ─► beacon id ─► freshness ─► write
//!          (handlers)  (schema)   (pipeline)   (pipeline)   (service)   (store)
//! ```
//!
//! Batches add a duplicate-key pass first and run the signature, beacon id,
//! and freshness checks concurrently per record. See [`service`] for the
//! phase table.
//!
//! # Quick Start
//!
//! ```no_run
//! use signed_data_pool::{BackendSignedDataStore, PoolConfig, SignedDataService, handlers};
//! use signed_data_pool_storage::MemoryBackend;
//!
//! # async fn run(body: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::default();
//! let store = BackendSignedDataStore::new(MemoryBackend::new(), config.batch_config()?);
//! let service = SignedDataService::new(store, config);
//!
//! let response = handlers::upsert_data(&service, Some(body.as_slice())).await;
//! println!("{} {}", response.status_code, response.body_string());
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (fixture record, signed
//!   record builder, in-memory service).
//! - **`failpoints`**: Activates storage failpoints for fault injection tests.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod record;
pub mod response;
pub mod schema;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

pub use config::PoolConfig;
pub use error::PoolError;
pub use record::{RecordKey, SignedRecord};
pub use response::ApiResponse;
pub use schema::SchemaViolation;
pub use service::SignedDataService;
pub use store::{BackendSignedDataStore, SignedDataStore};
