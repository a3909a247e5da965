//! Builders for signed records and in-memory services.
//!
//! Gated behind the `testutil` feature:
//!
//! ```toml
//! [dev-dependencies]
//! signed-data-pool = { path = "../pool", features = ["testutil"] }
//! ```

use signed_data_pool_signing::{
    B256, derive_beacon_id,
    testutil::{
        FIXTURE_AIRNODE, FIXTURE_BEACON_ID, FIXTURE_ENCODED_VALUE, FIXTURE_ENDPOINT_ID,
        FIXTURE_FEED_NAME, FIXTURE_OIS_TITLE, FIXTURE_PARAMETERS, FIXTURE_SIGNATURE,
        FIXTURE_TEMPLATE_ID, FIXTURE_TIMESTAMP, TestWallet,
    },
};
use signed_data_pool_storage::MemoryBackend;

use crate::{
    config::PoolConfig, record::SignedRecord, service::SignedDataService,
    store::BackendSignedDataStore,
};

/// Service over a fresh [`MemoryBackend`].
pub type MemoryService = SignedDataService<BackendSignedDataStore<MemoryBackend>>;

/// The reference data point signed by a real airnode.
#[must_use]
pub fn fixture_record() -> SignedRecord {
    SignedRecord {
        feed_name: FIXTURE_FEED_NAME.into(),
        ois_title: FIXTURE_OIS_TITLE.into(),
        beacon_id: FIXTURE_BEACON_ID.into(),
        airnode: FIXTURE_AIRNODE.into(),
        endpoint_id: FIXTURE_ENDPOINT_ID.into(),
        template_id: FIXTURE_TEMPLATE_ID.into(),
        parameters: FIXTURE_PARAMETERS.into(),
        timestamp: FIXTURE_TIMESTAMP.into(),
        encoded_value: FIXTURE_ENCODED_VALUE.into(),
        signature: FIXTURE_SIGNATURE.into(),
    }
}

/// Builds a correctly signed record for `template` at `timestamp`.
///
/// The template id is `[template; 32]` and the value is the 32-byte
/// big-endian encoding of `value`.
///
/// # Panics
///
/// Panics if `timestamp` is not a decimal integer.
#[must_use]
pub fn signed_record(wallet: &TestWallet, template: u8, timestamp: &str, value: u64) -> SignedRecord {
    let template_id = B256::new([template; 32]);
    let airnode = wallet.address();

    let mut payload = [0u8; 32];
    payload[24..].copy_from_slice(&value.to_be_bytes());

    SignedRecord {
        feed_name: format!("FEED-{template}"),
        ois_title: "Test OIS".into(),
        beacon_id: derive_beacon_id(&airnode, &template_id).to_string(),
        airnode: airnode.to_string(),
        endpoint_id: B256::new([0xee; 32]).to_string(),
        template_id: template_id.to_string(),
        parameters: "0x".into(),
        timestamp: timestamp.into(),
        encoded_value: B256::new(payload).to_string(),
        signature: wallet.sign_data(&template_id, timestamp, &payload),
    }
}

/// A service over an empty in-memory backend.
///
/// # Panics
///
/// Panics if `config` yields an invalid batch configuration.
#[must_use]
pub fn memory_service(config: PoolConfig) -> MemoryService {
    let batch = config.batch_config().expect("valid batch configuration");
    let store = BackendSignedDataStore::new(MemoryBackend::new(), batch);
    SignedDataService::new(store, config)
}
