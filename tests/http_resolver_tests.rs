//! Integration Tests for the HTTP Resolver
//!
//! Serves a fake object storage bucket with axum on a loopback port and
//! resolves against it.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asset_url_cache::{
    Config, ConfigError, HttpResolver, MemoryStore, ResolutionCache, ResolveError, Resolver,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};

// == Fake Bucket ==

#[derive(Default)]
struct FakeBucket {
    objects: HashSet<String>,
    /// Key -> number of 503 answers before serving it
    unavailable: Mutex<HashMap<String, u32>>,
    hits: Mutex<HashMap<String, u32>>,
}

impl FakeBucket {
    fn with_objects(keys: &[&str]) -> Self {
        Self {
            objects: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    fn unavailable_for(self, key: &str, times: u32) -> Self {
        self.unavailable
            .lock()
            .unwrap()
            .insert(key.to_string(), times);
        self
    }

    fn hits(&self, key: &str) -> u32 {
        self.hits.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

async fn object_handler(
    State(bucket): State<Arc<FakeBucket>>,
    Path(key): Path<String>,
) -> StatusCode {
    *bucket.hits.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

    if let Some(remaining) = bucket.unavailable.lock().unwrap().get_mut(&key) {
        if *remaining > 0 {
            *remaining -= 1;
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }

    if bucket.objects.contains(&key) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Serves `bucket` under `/o/:key` and returns the base URL.
async fn serve(bucket: Arc<FakeBucket>) -> String {
    let app = Router::new()
        .route("/o/:key", get(object_handler))
        .with_state(bucket);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/o/", addr)
}

fn resolver(base_url: &str) -> HttpResolver {
    HttpResolver::new(base_url, Duration::from_secs(2)).unwrap()
}

// == Resolver Tests ==

#[tokio::test]
async fn test_existing_object_resolves() {
    let bucket = Arc::new(FakeBucket::with_objects(&["chapters/1/fig 2.png"]));
    let base = serve(bucket.clone()).await;

    let url = resolver(&base).resolve("chapters/1/fig 2.png").await.unwrap();

    assert_eq!(url, format!("{}chapters%2F1%2Ffig%202.png?alt=media", base));
    assert_eq!(bucket.hits("chapters/1/fig 2.png"), 1);
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let base = serve(Arc::new(FakeBucket::default())).await;

    let err = resolver(&base).resolve("nope.png").await.unwrap_err();

    assert_eq!(err, ResolveError::NotFound("nope.png".to_string()));
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let bucket = Arc::new(FakeBucket::with_objects(&["a.png"]).unavailable_for("a.png", 1));
    let base = serve(bucket).await;

    let err = resolver(&base).resolve("a.png").await.unwrap_err();

    assert_eq!(
        err,
        ResolveError::Status {
            key: "a.png".to_string(),
            status: 503
        }
    );
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = resolver(&format!("http://{}/o/", addr))
        .resolve("a.png")
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Network(_)));
}

#[test]
fn test_unset_base_url_fails_fast() {
    let config = Config::default();
    assert_eq!(
        HttpResolver::from_config(&config).unwrap_err(),
        ConfigError::MissingBaseUrl
    );
}

// == End to End ==

async fn cache_against(bucket: Arc<FakeBucket>) -> ResolutionCache {
    let base = serve(bucket).await;
    let config = Config::default()
        .with_base_url(base)
        .with_retry_base_delay(Duration::from_millis(10))
        .with_sweep_interval(Duration::ZERO);
    let resolver = HttpResolver::from_config(&config).unwrap();

    ResolutionCache::init(config, Arc::new(resolver), Arc::new(MemoryStore::new()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_batch_against_bucket() {
    let bucket = Arc::new(
        FakeBucket::with_objects(&["a.png", "flaky.png"]).unavailable_for("flaky.png", 2),
    );
    let cache = cache_against(bucket.clone()).await;

    let report = cache
        .resolve_batch(&["a.png", "flaky.png", "missing.png"])
        .await;

    let mut ok: Vec<&str> = report.successful.iter().map(|r| r.key.as_str()).collect();
    ok.sort();
    assert_eq!(ok, vec!["a.png", "flaky.png"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, "missing.png");

    // 503 twice then 200; a 404 is not retried
    assert_eq!(bucket.hits("flaky.png"), 3);
    assert_eq!(bucket.hits("missing.png"), 1);
}

#[tokio::test]
async fn test_cached_url_skips_network() {
    let bucket = Arc::new(FakeBucket::with_objects(&["a.png"]));
    let cache = cache_against(bucket.clone()).await;

    let first = cache.resolve_one("a.png").await;
    let second = cache.resolve_one("a.png").await;

    assert_eq!(first.url, second.url);
    assert_eq!(second.from_cache, Some(true));
    assert_eq!(bucket.hits("a.png"), 1);
}
