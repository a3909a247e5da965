//! Axum routing over the pool handlers.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use signed_data_pool::{ApiResponse, SignedDataService, SignedDataStore, handlers};
use tracing::error;

/// Converts a pool response into an HTTP response.
pub fn into_http(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(response.body_string())).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn non_empty(body: &Bytes) -> Option<&[u8]> {
    if body.is_empty() { None } else { Some(body.as_ref()) }
}

async fn upsert<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
    body: Bytes,
) -> Response {
    into_http(handlers::upsert_data(&service, non_empty(&body)).await)
}

async fn batch_upsert<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
    body: Bytes,
) -> Response {
    into_http(handlers::batch_upsert_data(&service, non_empty(&body)).await)
}

async fn list<S: SignedDataStore>(State(service): State<SignedDataService<S>>) -> Response {
    into_http(handlers::list_data(&service).await)
}

async fn by_airnode<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
    Path(airnode): Path<String>,
) -> Response {
    into_http(handlers::get_data(&service, &airnode).await)
}

async fn by_key<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
    Path((airnode, template_id)): Path<(String, String)>,
) -> Response {
    into_http(handlers::get_record(&service, &airnode, &template_id).await)
}

async fn by_beacon_id<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
    Path(beacon_id): Path<String>,
) -> Response {
    into_http(handlers::get_by_beacon_id(&service, &beacon_id).await)
}

/// `GET /beacons` with no id. The static `beacons` segment shadows
/// `/:airnode`, so the word is validated as an airnode here.
async fn beacons_without_id<S: SignedDataStore>(
    State(service): State<SignedDataService<S>>,
) -> Response {
    into_http(handlers::get_data(&service, "beacons").await)
}

async fn healthz<S: SignedDataStore>(State(service): State<SignedDataService<S>>) -> Response {
    into_http(handlers::health(&service).await)
}

/// Builds the application router.
pub fn router<S: SignedDataStore>(service: SignedDataService<S>) -> Router {
    Router::new()
        .route("/", post(upsert::<S>).get(list::<S>))
        .route("/batch", post(batch_upsert::<S>))
        .route("/healthz", get(healthz::<S>))
        .route("/beacons", get(beacons_without_id::<S>))
        .route("/beacons/:beacon_id", get(by_beacon_id::<S>))
        .route("/:airnode", get(by_airnode::<S>))
        .route("/:airnode/:template_id", get(by_key::<S>))
        .with_state(service)
}
