mod common;

use std::time::Duration;

use promptcast_core::PanelSource;
use promptcast_engine::{
    query_all, DocumentLoader, FailureKind, FetchSettings, HttpDocumentLoader, LoadError,
    SnapshotLoader,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(url: &str) -> PanelSource {
    PanelSource::new(url, 0).expect("valid url")
}

#[tokio::test]
async fn http_loader_wraps_the_page_in_a_document() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><div class=prose>ready</div></body></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings::default());

    let document = loader
        .load(&source(&format!("{}/chat", server.uri())))
        .await
        .expect("load ok");

    let found = query_all(document.as_ref(), "div.prose");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "ready");
}

#[tokio::test]
async fn http_loader_fails_on_http_status() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings::default());

    let err = loader
        .load(&source(&format!("{}/missing", server.uri())))
        .await
        .err()
        .expect("load fails");

    assert!(matches!(err, LoadError::Fetch(fetch) if fetch.kind == FailureKind::HttpStatus(404)));
}

#[tokio::test]
async fn http_loader_rejects_non_html_pages() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings::default());

    let err = loader
        .load(&source(&format!("{}/api", server.uri())))
        .await
        .err()
        .expect("load fails");

    assert!(matches!(
        err,
        LoadError::Fetch(fetch) if matches!(fetch.kind, FailureKind::UnsupportedContentType { .. })
    ));
}

#[tokio::test]
async fn http_loader_times_out_on_slow_response() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("<p>slow</p>", "text/html"),
        )
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    });

    let err = loader
        .load(&source(&format!("{}/slow", server.uri())))
        .await
        .err()
        .expect("load fails");

    assert!(matches!(err, LoadError::Fetch(fetch) if fetch.kind == FailureKind::Timeout));
}

#[tokio::test]
async fn http_loader_rejects_oversized_pages() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    });

    let err = loader
        .load(&source(&format!("{}/large", server.uri())))
        .await
        .err()
        .expect("load fails");

    assert!(matches!(
        err,
        LoadError::Fetch(fetch) if matches!(fetch.kind, FailureKind::TooLarge { max_bytes: 10, .. })
    ));
}

#[tokio::test]
async fn snapshot_loader_reads_the_page_for_the_hostname() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("claude.ai.html"),
        "<div class=\"font-claude-message\">saved reply</div>",
    )
    .unwrap();
    let loader = SnapshotLoader::new(dir.path());

    let document = loader.load(&source("https://claude.ai/new")).await.unwrap();

    assert_eq!(query_all(document.as_ref(), ".font-claude-message")[0].text, "saved reply");
}

#[tokio::test]
async fn snapshot_loader_reports_missing_pages() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let loader = SnapshotLoader::new(dir.path());

    let err = loader
        .load(&source("https://grok.com/"))
        .await
        .err()
        .expect("load fails");

    assert!(matches!(err, LoadError::Snapshot { path, .. } if path.ends_with("grok.com.html")));
}

#[tokio::test]
async fn http_loader_follows_redirects_up_to_the_limit() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p class=prose>moved</p>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;
    let loader = HttpDocumentLoader::new(FetchSettings::default());

    let document = loader
        .load(&source(&format!("{}/old", server.uri())))
        .await
        .expect("redirect followed");
    let err = loader
        .load(&source(&format!("{}/loop", server.uri())))
        .await
        .err()
        .expect("loop rejected");

    assert_eq!(query_all(document.as_ref(), ".prose")[0].text, "moved");
    assert!(matches!(err, LoadError::Fetch(fetch) if fetch.kind == FailureKind::RedirectLimitExceeded));
}
