//! Verifies that `MemoryBackend` operations emit the expected tracing spans.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use signed_data_pool_storage::{MemoryBackend, StorageBackend};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

/// Records the name of every span created while installed.
#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

fn install_collector() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));
    (spans, guard)
}

#[tokio::test]
async fn prefix_scan_is_traced_as_range_read() {
    let (spans, _guard) = install_collector();

    let backend = MemoryBackend::new();
    backend.set(b"signed-data/0xaa/0x01".to_vec(), b"{}".to_vec()).await.expect("set");
    let found = backend.get_prefix(b"signed-data/0xaa/").await.expect("get_prefix");
    assert_eq!(found.len(), 1);

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "get_range"), "got: {recorded:?}");
}

#[tokio::test]
async fn every_backend_operation_produces_a_span() {
    let (spans, _guard) = install_collector();

    let backend = MemoryBackend::new();
    backend.set(b"k".to_vec(), b"v".to_vec()).await.expect("set");
    let _ = backend.get(b"k").await;
    backend.delete(b"k").await.expect("delete");
    let _ = backend.get_range(b"a".to_vec()..b"z".to_vec()).await;
    let _ = backend.transaction().await;
    let _ = backend.health_check().await;

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["set", "get", "delete", "get_range", "transaction", "health_check"] {
        assert!(
            recorded.iter().any(|s| s == name),
            "missing span '{name}', recorded: {recorded:?}"
        );
    }
}
