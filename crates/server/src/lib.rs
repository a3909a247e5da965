//! HTTP server for the signed data pool.
//!
//! Routes:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/` | single upsert |
//! | `POST` | `/batch` | batch upsert |
//! | `GET` | `/` | every record |
//! | `GET` | `/{airnode}` | one airnode's records |
//! | `GET` | `/{airnode}/{templateId}` | one record |
//! | `GET` | `/beacons/{beaconId}` | one record by derived beacon id |
//! | `GET` | `/healthz` | storage reachability |

#![deny(unsafe_code)]

pub mod config;
pub mod http;

pub use config::{ServerConfig, ServerConfigError};
pub use http::{into_http, router};
