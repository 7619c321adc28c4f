mod common;

use std::sync::Arc;
use std::time::Duration;

use promptcast_engine::{wait_for_element, wait_for_enabled, MarkupDocument};
use tokio::time::Instant;

fn render_later(document: &Arc<MarkupDocument>, after: Duration, markup: &str) {
    let document = document.clone();
    let markup = markup.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        document.replace_markup(markup);
    });
}

#[tokio::test(start_paused = true)]
async fn present_element_resolves_without_waiting() {
    common::init_logging();
    let document = MarkupDocument::new(r#"<textarea id="prompt"></textarea>"#);
    let started = Instant::now();

    let found = wait_for_element(&document, "#prompt", Duration::from_secs(10)).await;

    assert_eq!(found.map(|f| f.tag), Some("textarea".to_string()));
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn element_rendered_later_resolves_on_that_mutation() {
    common::init_logging();
    let document = Arc::new(MarkupDocument::new("<main></main>"));
    render_later(&document, Duration::from_millis(300), "<main><p>noise</p></main>");
    render_later(
        &document,
        Duration::from_millis(700),
        r#"<main><textarea id="prompt"></textarea></main>"#,
    );
    let started = Instant::now();

    let found = wait_for_element(document.as_ref(), "#prompt", Duration::from_secs(10)).await;

    assert!(found.is_some());
    assert_eq!(started.elapsed(), Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn absent_element_resolves_to_none_exactly_at_timeout() {
    common::init_logging();
    let document = Arc::new(MarkupDocument::new("<main></main>"));
    render_later(&document, Duration::from_millis(50), "<main><p>still nothing</p></main>");
    let started = Instant::now();

    let found = wait_for_element(document.as_ref(), "#prompt", Duration::from_millis(400)).await;

    assert!(found.is_none());
    assert_eq!(started.elapsed(), Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn disabled_control_is_not_ready_until_enabled() {
    common::init_logging();
    let document = Arc::new(MarkupDocument::new("<button id=send disabled>Send</button>"));
    render_later(&document, Duration::from_secs(1), "<button id=send>Send</button>");
    let started = Instant::now();

    let found = wait_for_enabled(document.as_ref(), "#send", Duration::from_secs(5)).await;

    assert!(found.is_some_and(|f| f.enabled));
    assert_eq!(started.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn waiting_on_a_document_that_cannot_change_still_honours_the_timeout() {
    common::init_logging();
    let document = MarkupDocument::new("<main></main>");
    let started = Instant::now();

    let found = wait_for_element(&document, "#missing", Duration::from_millis(250)).await;

    assert!(found.is_none());
    assert_eq!(started.elapsed(), Duration::from_millis(250));
}
