//! Request handlers.
//!
//! Each handler takes the raw body or path parameters, runs the matching
//! service operation, and renders the outcome as an [`ApiResponse`]. The
//! handlers never fail; every error becomes a response.

use serde_json::Value;
use signed_data_pool_signing::{
    Address, B256, SigningError,
    validation::{is_evm_address, is_evm_id},
};

use crate::{
    error::{
        MSG_BATCH_SCHEMA, MSG_BODY_MISSING, MSG_BODY_NOT_JSON, MSG_PATH_AIRNODE_MISSING,
        MSG_PATH_NOT_ADDRESS, MSG_PATH_NOT_ID, MSG_RECORD_SCHEMA, PoolError,
    },
    record::RecordKey,
    response::ApiResponse,
    schema::{validate_batch, validate_record},
    service::SignedDataService,
    store::SignedDataStore,
};

fn parse_body(body: Option<&[u8]>) -> Result<Value, PoolError> {
    let body = body.ok_or(PoolError::MalformedRequest { message: MSG_BODY_MISSING, detail: None })?;
    serde_json::from_slice(body).map_err(|e| PoolError::malformed(MSG_BODY_NOT_JSON, e.to_string()))
}

fn parse_address(raw: &str) -> Result<Address, PoolError> {
    if raw.is_empty() {
        return Err(PoolError::MalformedRequest { message: MSG_PATH_AIRNODE_MISSING, detail: None });
    }
    if !is_evm_address(raw) {
        return Err(PoolError::malformed(MSG_PATH_NOT_ADDRESS, raw));
    }
    raw.parse().map_err(|e: SigningError| PoolError::malformed(MSG_PATH_NOT_ADDRESS, e.to_string()))
}

fn parse_id(raw: &str) -> Result<B256, PoolError> {
    if !is_evm_id(raw) {
        return Err(PoolError::malformed(MSG_PATH_NOT_ID, raw));
    }
    raw.parse().map_err(|e: SigningError| PoolError::malformed(MSG_PATH_NOT_ID, e.to_string()))
}

fn respond<T>(outcome: Result<T, PoolError>, ok: impl FnOnce(T) -> ApiResponse) -> ApiResponse {
    outcome.map_or_else(ApiResponse::from, ok)
}

/// `POST /`: validates and stores one signed record.
pub async fn upsert_data<S: SignedDataStore>(
    service: &SignedDataService<S>,
    body: Option<&[u8]>,
) -> ApiResponse {
    let outcome = async {
        let raw = parse_body(body)?;
        let record = validate_record(&raw)
            .map_err(|v| PoolError::malformed(MSG_RECORD_SCHEMA, v.to_string()))?;
        service.upsert(record).await
    }
    .await;
    respond(outcome, |()| ApiResponse::created(1))
}

/// `POST /batch`: validates and stores a batch, all or nothing up to the
/// final write.
pub async fn batch_upsert_data<S: SignedDataStore>(
    service: &SignedDataService<S>,
    body: Option<&[u8]>,
) -> ApiResponse {
    let outcome = async {
        let raw = parse_body(body)?;
        let records = validate_batch(&raw, service.config().max_batch_size())
            .map_err(|v| PoolError::malformed(MSG_BATCH_SCHEMA, v.to_string()))?;
        service.batch_upsert(records).await
    }
    .await;
    respond(outcome, ApiResponse::created)
}

/// `GET /{airnode}`: every record of one airnode.
pub async fn get_data<S: SignedDataStore>(
    service: &SignedDataService<S>,
    airnode: &str,
) -> ApiResponse {
    let outcome = async {
        let airnode = parse_address(airnode)?;
        service.list_by_airnode(&airnode).await
    }
    .await;
    respond(outcome, ApiResponse::list)
}

/// `GET /{airnode}/{templateId}`: one record by its storage key.
pub async fn get_record<S: SignedDataStore>(
    service: &SignedDataService<S>,
    airnode: &str,
    template_id: &str,
) -> ApiResponse {
    let outcome = async {
        let key = RecordKey::new(parse_address(airnode)?, parse_id(template_id)?);
        service.get_record(&key).await
    }
    .await;
    respond(outcome, |record| ApiResponse::record(&record))
}

/// `GET /beacons/{beaconId}`: one record by derived beacon id.
pub async fn get_by_beacon_id<S: SignedDataStore>(
    service: &SignedDataService<S>,
    beacon_id: &str,
) -> ApiResponse {
    let outcome = async {
        let beacon_id = parse_id(beacon_id)?;
        service.get_by_beacon_id(&beacon_id).await
    }
    .await;
    respond(outcome, |record| ApiResponse::record(&record))
}

/// `GET /`: every stored record.
pub async fn list_data<S: SignedDataStore>(service: &SignedDataService<S>) -> ApiResponse {
    respond(service.list_all().await, ApiResponse::list)
}

/// `GET /healthz`: storage reachability.
pub async fn health<S: SignedDataStore>(service: &SignedDataService<S>) -> ApiResponse {
    respond(service.health().await, |()| ApiResponse::healthy())
}
