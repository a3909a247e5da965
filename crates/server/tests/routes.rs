//! Exercises the router over a real socket.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;

use signed_data_pool::{
    PoolConfig,
    testutil::{fixture_record, memory_service},
};
use signed_data_pool_server::router;
use signed_data_pool_signing::testutil::{FIXTURE_AIRNODE, FIXTURE_BEACON_ID, FIXTURE_TEMPLATE_ID};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = router(memory_service(PoolConfig::default()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

/// Sends one HTTP/1.1 request and returns `(status, body)`.
async fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\
         content-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.expect("write");

    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");

    let status = response[9..12].parse().expect("status code");
    let body = response.split_once("\r\n\r\n").map(|(_, b)| b.to_owned()).unwrap_or_default();
    (status, body)
}

#[tokio::test]
async fn upsert_and_read_over_http() {
    let addr = spawn_server().await;
    let payload = serde_json::to_string(&fixture_record()).unwrap();

    let (status, body) = request(addr, "POST", "/", &payload).await;
    assert_eq!(status, 201, "body: {body}");
    assert_eq!(body, r#"{"count":1}"#);

    let (status, body) = request(addr, "GET", &format!("/beacons/{FIXTURE_BEACON_ID}"), "").await;
    assert_eq!(status, 200);
    let record: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(record["templateId"], FIXTURE_TEMPLATE_ID);

    let (status, _) =
        request(addr, "GET", &format!("/{FIXTURE_AIRNODE}/{FIXTURE_TEMPLATE_ID}"), "").await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/", "").await;
    assert_eq!(status, 200);
    assert!(body.starts_with(r#"{"count":1"#), "body: {body}");
}

#[tokio::test]
async fn empty_body_is_missing() {
    let addr = spawn_server().await;
    let (status, body) = request(addr, "POST", "/batch", "").await;
    assert_eq!(status, 400);
    assert_eq!(body, r#"{"message":"Invalid request, http body is missing"}"#);
}

#[tokio::test]
async fn invalid_airnode_path_is_rejected() {
    let addr = spawn_server().await;
    let (status, body) = request(addr, "GET", "/not-an-address", "").await;
    assert_eq!(status, 400);
    assert!(body.contains("path parameter must be an EVM address"), "body: {body}");
}

#[tokio::test]
async fn bare_beacons_path_is_rejected_as_airnode() {
    let addr = spawn_server().await;
    let (status, body) = request(addr, "GET", "/beacons", "").await;
    assert_eq!(status, 400);
    assert!(body.contains("path parameter must be an EVM address"), "body: {body}");
}

#[tokio::test]
async fn health_endpoint_is_ok() {
    let addr = spawn_server().await;
    let (status, _) = request(addr, "GET", "/healthz", "").await;
    assert_eq!(status, 200);
}
