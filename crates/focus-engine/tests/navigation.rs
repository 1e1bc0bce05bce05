mod common;

use std::time::Duration;

use common::*;
use focus_engine::EngineConfig;
use focusfeed_core_types::ItemStatus;
use page_port::{DocumentPort, ElementSpec};

/// Long enough for the watcher to notice a location change.
const NOTICE: Duration = Duration::from_millis(600);

#[tokio::test(start_paused = true)]
async fn navigation_rescans_and_reattaches() {
    let (doc, _) = home_page(vec![video("Sine rule explained")]);
    let model = ScriptedEmbedder::new();
    let focus = controller(&doc, &model, EngineConfig::default());

    focus.activate("trigonometry").await.unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);

    doc.navigate(
        "https://www.youtube.com/results?search_query=trigonometry",
        &[app(vec![video("Law of sines"), video("Pasta carbonara")])],
    )
    .unwrap();
    tokio::time::sleep(NOTICE).await;
    assert!(focus.wait_until_settled(SETTLE).await);

    assert_eq!(marked(&doc).len(), 1);
    assert_eq!(placeholders(&doc).len(), 1);
    let metrics = focus.metrics();
    assert_eq!(metrics.navigations, 1);
    assert_eq!(metrics.navigation_timeouts, 0);
    assert!(focus.listener_connected());
    assert!(focus.navigation_running());

    // the listener follows the new page
    let item = doc
        .append_child(contents(&doc), video("Cooking with kids"))
        .unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);
    assert!(!doc.is_connected(item));
    assert_eq!(placeholders(&doc).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_pages_are_scanned_after_the_timeout() {
    let (doc, _) = home_page(vec![video("Sine rule explained")]);
    let model = ScriptedEmbedder::new();
    let focus = controller(&doc, &model, EngineConfig::default());

    focus.activate("trigonometry").await.unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);
    let scans = focus.metrics().scans;

    doc.navigate("https://www.youtube.com/feed/trending", &[app(Vec::new())])
        .unwrap();
    tokio::time::sleep(NOTICE).await;
    assert!(focus.wait_until_settled(SETTLE).await);

    let metrics = focus.metrics();
    assert_eq!(metrics.navigations, 1);
    assert_eq!(metrics.navigation_timeouts, 1);
    assert_eq!(metrics.scans, scans + 1);
    assert!(focus.listener_connected());

    // content that arrives late is still caught by the listener
    doc.append_child(contents(&doc), video("Pasta carbonara"))
        .unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);
    assert_eq!(placeholders(&doc).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn watch_page_rail_is_purged_under_a_topic_header() {
    let (doc, _) = home_page(Vec::new());
    let model = ScriptedEmbedder::new();
    let focus = controller(&doc, &model, EngineConfig::default());

    focus.activate("trigonometry").await.unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);

    let rail = ElementSpec::new("ytd-watch-next-secondary-results-renderer")
        .with_child(video("Pasta carbonara"))
        .with_child(video("Sine waves"));
    doc.navigate(
        "https://www.youtube.com/watch?v=abc",
        &[app(vec![video("Law of sines")])
            .with_child(ElementSpec::new("div").with_id("secondary").with_child(rail))],
    )
    .unwrap();
    tokio::time::sleep(NOTICE).await;
    assert!(focus.wait_until_settled(SETTLE).await);

    assert!(doc
        .query_all("ytd-watch-next-secondary-results-renderer")
        .unwrap()
        .is_empty());
    assert_eq!(videos(&doc).len(), 1);
    assert_eq!(marked(&doc).len(), 1);
    assert!(placeholders(&doc).is_empty());

    let header = doc.query_all("#secondary > *").unwrap();
    assert_eq!(header.len(), 1);
    assert_eq!(
        doc.text_content(header[0]).unwrap(),
        "Focusing on: trigonometry"
    );

    focus.deactivate();
    assert!(doc.query_all("#focusfeed-topic-header").unwrap().is_empty());
    assert!(doc.is_connected(doc.query_all("#secondary").unwrap()[0]));
}

#[tokio::test(start_paused = true)]
async fn navigation_while_inactive_is_ignored() {
    let (doc, _) = home_page(vec![video("Sine rule explained")]);
    let model = ScriptedEmbedder::new();
    let focus = controller(&doc, &model, EngineConfig::default());

    focus.activate("trigonometry").await.unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);
    focus.deactivate();

    doc.navigate(
        "https://www.youtube.com/results?search_query=pasta",
        &[app(vec![video("Pasta carbonara")])],
    )
    .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(focus.metrics().navigations, 0);
    assert!(placeholders(&doc).is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_during_a_busy_drain_keeps_every_item() {
    let (doc, feed) = home_page(Vec::new());
    let model = ScriptedEmbedder::with_delays(Duration::from_millis(200), Duration::from_millis(300));
    let focus = controller(&doc, &model, EngineConfig::default());

    focus.activate("trigonometry").await.unwrap();
    assert!(focus.wait_until_settled(SETTLE).await);

    doc.append_children(
        feed,
        &[
            video("Sine rule explained"),
            video("Pasta carbonara"),
            video("Law of sines"),
            video("Cooking with kids"),
        ],
    )
    .unwrap();
    // the feed container survives the location change, only the url moves
    doc.set_location("https://www.youtube.com/results?search_query=trigonometry");
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(focus.wait_until_settled(SETTLE).await);

    let metrics = focus.metrics();
    assert_eq!(metrics.navigations, 1);
    assert_eq!(metrics.relevant, 2);
    assert_eq!(metrics.filtered, 2);
    assert_eq!(marked(&doc).len(), 2);
    assert_eq!(placeholders(&doc).len(), 2);
    for item in videos(&doc) {
        assert_eq!(focus.pipeline().status_of(item), ItemStatus::Relevant);
    }
    assert_eq!(focus.pending_len(), 0);
    assert!(focus.listener_connected());
}
