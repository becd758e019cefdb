use ninetailed_events::{BuildContext, ComponentExposure, EventBuilder};
use ninetailed_sdk::api::transport::mock::MockInsightsTransport;
use ninetailed_sdk::{ApiError, InsightsBatcher};
use ninetailed_types::{ElementId, Event, ObservedElementPayload, Profile, Reference};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn view(payload: &ObservedElementPayload) -> Event {
    let exposure = ComponentExposure::from(payload);
    EventBuilder::new().component(&BuildContext::new("https://example.com/"), &exposure, Some(2000))
}

fn any_event() -> Event {
    view(&ObservedElementPayload::baseline(Reference::new("hero")))
}

fn batcher(batch_size: usize) -> (MockInsightsTransport, InsightsBatcher) {
    let transport = MockInsightsTransport::new();
    let batcher = InsightsBatcher::new(Arc::new(transport.clone()), batch_size);
    (transport, batcher)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ── Threshold ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn batch_is_sent_when_threshold_is_reached() {
    let (transport, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));

    for _ in 0..24 {
        batcher.add(any_event());
    }
    settle().await;
    assert!(transport.sent().is_empty());
    assert_eq!(batcher.current_len(), 24);

    batcher.add(any_event());
    settle().await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[0][0].profile.id, "p-1");
    assert_eq!(sent[0][0].events.len(), 25);
    assert_eq!(batcher.current_len(), 0);
    assert_eq!(batcher.pending_batches(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_batch_size_is_treated_as_one() {
    let (transport, batcher) = batcher(0);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    settle().await;
    assert_eq!(transport.sent_events().len(), 1);
}

// ── Profiles ─────────────────────────────────────────────────────

#[tokio::test]
async fn events_before_a_profile_wait() {
    let (transport, batcher) = batcher(25);
    batcher.add(any_event());
    batcher.add(any_event());
    assert_eq!(batcher.waiting_len(), 2);
    assert_eq!(batcher.current_len(), 0);

    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    assert_eq!(batcher.waiting_len(), 0);
    assert_eq!(batcher.current_len(), 2);

    batcher.flush().await.unwrap();
    assert_eq!(transport.sent()[0][0].events.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn waiting_events_keep_only_the_newest_batch() {
    let (transport, batcher) = batcher(3);
    let events: Vec<Event> = (0..5).map(|_| any_event()).collect();
    for event in &events {
        batcher.add(event.clone());
    }
    assert_eq!(batcher.waiting_len(), 3);

    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    settle().await;

    let delivered: Vec<_> = transport.sent_events().iter().map(|e| e.message_id).collect();
    let newest: Vec<_> = events[2..].iter().map(|e| e.message_id).collect();
    assert_eq!(delivered, newest);
}

#[tokio::test]
async fn profile_switch_closes_batch_under_previous_profile() {
    let (transport, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    batcher.add(any_event());

    batcher.set_profile(Some(Profile::new("p-2", "s-1")));
    assert_eq!(batcher.pending_batches(), 1);
    batcher.add(any_event());

    batcher.flush().await.unwrap();
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let per_profile: Vec<(String, usize)> = sent[0]
        .iter()
        .map(|b| (b.profile.id.clone(), b.events.len()))
        .collect();
    assert_eq!(per_profile, vec![("p-1".to_string(), 2), ("p-2".to_string(), 1)]);
}

#[tokio::test]
async fn same_profile_refresh_keeps_batching() {
    let (_, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    batcher.set_profile(Some(Profile::new("p-1", "s-1").with_audience("vip")));
    assert_eq!(batcher.pending_batches(), 0);
    assert_eq!(batcher.current_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn closed_batches_count_towards_threshold() {
    let (transport, batcher) = batcher(3);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    batcher.add(any_event());
    batcher.set_profile(Some(Profile::new("p-2", "s-2")));
    settle().await;
    assert!(transport.sent().is_empty());

    batcher.add(any_event());
    settle().await;
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(transport.sent_events().len(), 3);
}

// ── Delivery ─────────────────────────────────────────────────────

#[tokio::test]
async fn flush_without_events_sends_nothing() {
    let (transport, batcher) = batcher(25);
    batcher.flush().await.unwrap();
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failed_delivery_drops_batches() {
    let (transport, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    transport.fail_next(ApiError::Timeout);

    assert!(batcher.flush().await.is_err());
    assert_eq!(batcher.pending_batches(), 0);

    batcher.flush().await.unwrap();
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn page_hide_beacons_everything() {
    let (transport, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    batcher.add(any_event());
    batcher.set_profile(Some(Profile::new("p-2", "s-2")));
    batcher.add(any_event());

    assert!(batcher.on_page_hide());

    let beacons = transport.beacons();
    assert_eq!(beacons.len(), 1);
    assert_eq!(beacons[0].len(), 2);
    assert!(transport.sent().is_empty());
    assert_eq!(batcher.current_len(), 0);
    assert_eq!(batcher.pending_batches(), 0);
}

#[tokio::test]
async fn page_hide_without_events_skips_beacon() {
    let (transport, batcher) = batcher(25);
    assert!(batcher.on_page_hide());
    assert!(transport.beacons().is_empty());
}

// ── View dedupe ──────────────────────────────────────────────────

#[tokio::test]
async fn same_payload_is_viewed_once_per_element() {
    let (_, batcher) = batcher(25);
    batcher.set_profile(Some(Profile::new("p-1", "s-1")));
    let element = ElementId::from_raw(1);
    let payload = ObservedElementPayload::baseline(Reference::new("hero"));
    let other = ObservedElementPayload::baseline(Reference::new("footer"));

    assert!(batcher.add_view(element, &payload, view(&payload)));
    assert!(!batcher.add_view(element, &payload, view(&payload)));
    assert!(batcher.add_view(element, &other, view(&other)));
    assert!(batcher.add_view(ElementId::from_raw(2), &payload, view(&payload)));
    assert_eq!(batcher.current_len(), 3);

    batcher.forget_element(element);
    assert!(batcher.add_view(element, &payload, view(&payload)));
}
