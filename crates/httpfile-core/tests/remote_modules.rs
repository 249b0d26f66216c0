//! Loader behavior against a live (in-process) HTTP server: caching,
//! request coalescing, redirects, content-kind inference, failures.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use httpfile_core::{ContentKind, HttpClient, HttpLoader, LoadError, ModuleUrl};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serve a router on an ephemeral port; returns the base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn loader() -> HttpLoader {
    HttpLoader::new(HttpClient::new().unwrap())
}

#[tokio::test]
async fn test_second_load_is_a_cache_hit() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_route = Arc::clone(&hits);

    let app = Router::new().route(
        "/m.mjs",
        get(move || {
            hits_route.fetch_add(1, Ordering::SeqCst);
            async {
                (
                    [(header::CONTENT_TYPE, "text/javascript")],
                    "export const x = 1;",
                )
            }
        }),
    );
    let base = serve(app).await;

    let loader = loader();
    let url = ModuleUrl::parse(&format!("{base}/m.mjs")).unwrap();

    let first = loader.load(&url).await.unwrap();
    let second = loader.load(&url).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.text(), "export const x = 1;");
    assert_eq!(first.kind, ContentKind::Script);
}

#[tokio::test]
async fn test_concurrent_loads_coalesce_to_one_fetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_route = Arc::clone(&hits);

    let app = Router::new().route(
        "/slow.mjs",
        get(move || {
            hits_route.fetch_add(1, Ordering::SeqCst);
            async {
                // Hold the response long enough for every caller to pile up.
                tokio::time::sleep(Duration::from_millis(150)).await;
                "export const slow = true;"
            }
        }),
    );
    let base = serve(app).await;

    let loader = loader();
    let url = ModuleUrl::parse(&format!("{base}/slow.mjs")).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let loader = loader.clone();
            let url = url.clone();
            tokio::spawn(async move { loader.load(&url).await })
        })
        .collect();

    let mut modules = Vec::new();
    for task in tasks {
        modules.push(task.await.unwrap().unwrap());
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    for module in &modules[1..] {
        assert!(Arc::ptr_eq(&modules[0], module));
    }
}

#[tokio::test]
async fn test_redirect_caches_both_ids_with_one_fetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_route = Arc::clone(&hits);

    let app = Router::new()
        .route("/mod.mjs", get(|| async { Redirect::temporary("/v2/mod.mjs") }))
        .route(
            "/v2/mod.mjs",
            get(move || {
                hits_route.fetch_add(1, Ordering::SeqCst);
                async { "export const v = 2;" }
            }),
        );
    let base = serve(app).await;

    let loader = loader();
    let original = ModuleUrl::parse(&format!("{base}/mod.mjs")).unwrap();
    let final_url = ModuleUrl::parse(&format!("{base}/v2/mod.mjs")).unwrap();

    let module = loader.load(&original).await.unwrap();
    assert_eq!(module.url, final_url);

    // Both ids alias the same cached module; no second round-trip.
    let via_original = loader.cached(&original).unwrap();
    let via_final = loader.cached(&final_url).unwrap();
    assert!(Arc::ptr_eq(&via_original, &via_final));

    let again = loader.load(&final_url).await.unwrap();
    assert!(Arc::ptr_eq(&module, &again));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_surfaces_status_error() {
    let app = Router::new();
    let base = serve(app).await;

    let loader = loader();
    let url = ModuleUrl::parse(&format!("{base}/missing.mjs")).unwrap();

    let err = loader.load(&url).await.unwrap_err();
    match &err {
        LoadError::Status { url: failed, status } => {
            assert_eq!(failed, &url);
            assert_eq!(*status, 404);
        }
        other => panic!("expected Status error, got {other:?}"),
    }

    // Failures are not cached; nothing must have been populated.
    assert!(loader.cached(&url).is_none());
    assert_eq!(loader.cached_count(), 0);
}

#[tokio::test]
async fn test_failed_fetch_can_be_retried_after_recovery() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_route = Arc::clone(&hits);

    // First request 500s, later ones succeed.
    let app = Router::new().route(
        "/flaky.mjs",
        get(move || {
            let n = hits_route.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
                } else {
                    "export const ok = 1;".into_response()
                }
            }
        }),
    );
    let base = serve(app).await;

    let loader = loader();
    let url = ModuleUrl::parse(&format!("{base}/flaky.mjs")).unwrap();

    let err = loader.load(&url).await.unwrap_err();
    assert!(matches!(err, LoadError::Status { status: 500, .. }));

    // The loader itself never retried.
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // A fresh call from the host is a new fetch, not a cached failure.
    let module = loader.load(&url).await.unwrap();
    assert_eq!(module.text(), "export const ok = 1;");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_content_kind_from_header_and_extension() {
    let app = Router::new()
        .route(
            "/styles.css",
            get(|| async { ([(header::CONTENT_TYPE, "text/css")], "body { margin: 0 }") }),
        )
        .route(
            "/data.json",
            get(|| async {
                (
                    // Generic type: the extension fallback decides.
                    [(header::CONTENT_TYPE, "application/octet-stream")],
                    r#"{"a": 1}"#,
                )
            }),
        )
        .route("/bare-module", get(|| async { "export default 1;" }));
    let base = serve(app).await;

    let loader = loader();

    let css = loader
        .load(&ModuleUrl::parse(&format!("{base}/styles.css")).unwrap())
        .await
        .unwrap();
    assert_eq!(css.kind, ContentKind::Style);

    let json = loader
        .load(&ModuleUrl::parse(&format!("{base}/data.json")).unwrap())
        .await
        .unwrap();
    assert_eq!(json.kind, ContentKind::Json);

    // No usable header, no extension: best-effort script.
    let bare = loader
        .load(&ModuleUrl::parse(&format!("{base}/bare-module")).unwrap())
        .await
        .unwrap();
    assert_eq!(bare.kind, ContentKind::Script);
}
