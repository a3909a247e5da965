//! Server configuration loaded from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PORT` | `8090` | listen port |
//! | `BIND_ADDRESS` | `0.0.0.0` | listen address |
//! | `MAX_BATCH_SIZE` | `100` | records per batch request |
//! | `WRITE_CHUNK_RECORDS` | `25` | records per storage transaction in a batch |
//! | `STORAGE_TIMEOUT_MS` | `10000` | per-call storage timeout |
//!
//! A set but unparseable variable is a startup error, never a silent default.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

use signed_data_pool::{
    PoolConfig,
    config::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_STORAGE_TIMEOUT, DEFAULT_WRITE_CHUNK_RECORDS},
};
use signed_data_pool_storage::ConfigError;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8090;

/// Errors raised while loading [`ServerConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerConfigError {
    /// A variable is set but does not parse.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar { var: &'static str, value: String, reason: String },

    /// The pool rejected the resulting configuration.
    #[error(transparent)]
    Pool(#[from] ConfigError),
}

/// Listen address plus pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub pool: PoolConfig,
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ServerConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ServerConfigError::InvalidVar {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

impl ServerConfig {
    /// Builds the configuration from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigError::InvalidVar`] for an unparseable variable
    /// and [`ServerConfigError::Pool`] for values the pool rejects (zero
    /// batch size, for example).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerConfigError> {
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let address = parse_var(&lookup, "BIND_ADDRESS", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let max_batch_size = parse_var(&lookup, "MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE)?;
        let write_chunk_records =
            parse_var(&lookup, "WRITE_CHUNK_RECORDS", DEFAULT_WRITE_CHUNK_RECORDS)?;
        let timeout_ms = parse_var(
            &lookup,
            "STORAGE_TIMEOUT_MS",
            u64::try_from(DEFAULT_STORAGE_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        )?;

        let pool = PoolConfig::builder()
            .max_batch_size(max_batch_size)
            .write_chunk_records(write_chunk_records)
            .storage_timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self { listen: SocketAddr::new(address, port), pool })
    }

    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }
}
