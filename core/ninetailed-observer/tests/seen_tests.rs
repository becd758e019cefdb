use ninetailed_observer::{ElementSeenObserver, SeenCallback};
use ninetailed_types::ElementId;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

type Seen = Arc<Mutex<Vec<(ElementId, Duration)>>>;

fn observer() -> (ElementSeenObserver, Seen) {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    let callback: SeenCallback = Arc::new(move |element: ElementId, delay: Duration| {
        sink.lock().unwrap().push((element, delay));
    });
    (ElementSeenObserver::new(callback), seen)
}

fn el(raw: u64) -> ElementId {
    ElementId::from_raw(raw)
}

const TWO_SECONDS: Duration = Duration::from_millis(2000);

// ── Dwell timers ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn fires_after_continuous_visibility() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);

    sleep(Duration::from_millis(1999)).await;
    assert!(seen.lock().unwrap().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(*seen.lock().unwrap(), vec![(el(1), TWO_SECONDS)]);
}

#[tokio::test(start_paused = true)]
async fn leaving_viewport_cancels_timer() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);

    sleep(Duration::from_millis(1500)).await;
    observer.on_intersection(el(1), false);
    sleep(Duration::from_millis(1000)).await;
    assert!(seen.lock().unwrap().is_empty());

    // A new cycle restarts the full dwell.
    observer.on_intersection(el(1), true);
    sleep(Duration::from_millis(1999)).await;
    assert!(seen.lock().unwrap().is_empty());
    sleep(Duration::from_millis(2)).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn multiple_delays_fire_independently() {
    let (observer, seen) = observer();
    observer.observe(el(1), Duration::from_millis(500));
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);

    sleep(Duration::from_millis(3000)).await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(el(1), Duration::from_millis(500)), (el(1), TWO_SECONDS)]
    );
    assert_eq!(observer.delays(el(1)), vec![Duration::from_millis(500), TWO_SECONDS]);
}

#[tokio::test(start_paused = true)]
async fn fires_once_per_cycle() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);
    // Repeated reports within one cycle do not re-arm.
    observer.on_intersection(el(1), true);
    observer.observe(el(1), TWO_SECONDS);

    sleep(Duration::from_millis(5000)).await;
    assert_eq!(seen.lock().unwrap().len(), 1);

    observer.on_intersection(el(1), false);
    observer.on_intersection(el(1), true);
    sleep(Duration::from_millis(2001)).await;
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unobserve_before_fire_suppresses_callback() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);

    sleep(Duration::from_millis(1000)).await;
    observer.unobserve(el(1));
    sleep(Duration::from_millis(5000)).await;

    assert!(seen.lock().unwrap().is_empty());
    assert!(!observer.is_observed(el(1)));
}

#[tokio::test(start_paused = true)]
async fn delay_added_while_intersecting_is_armed() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);
    sleep(Duration::from_millis(1000)).await;

    observer.observe(el(1), Duration::from_millis(300));
    sleep(Duration::from_millis(301)).await;
    assert_eq!(*seen.lock().unwrap(), vec![(el(1), Duration::from_millis(300))]);
}

#[tokio::test(start_paused = true)]
async fn reports_for_unknown_elements_are_ignored() {
    let (observer, seen) = observer();
    observer.on_intersection(el(42), true);
    sleep(Duration::from_millis(5000)).await;

    assert!(seen.lock().unwrap().is_empty());
    assert!(!observer.is_intersecting(el(42)));
}

#[tokio::test(start_paused = true)]
async fn elements_are_independent() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.observe(el(2), TWO_SECONDS);
    observer.on_intersection(el(1), true);
    observer.on_intersection(el(2), true);
    observer.on_intersection(el(2), false);

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(*seen.lock().unwrap(), vec![(el(1), TWO_SECONDS)]);
}

#[test]
fn without_runtime_nothing_is_armed() {
    let (observer, seen) = observer();
    observer.observe(el(1), TWO_SECONDS);
    observer.on_intersection(el(1), true);
    assert!(observer.is_intersecting(el(1)));
    assert!(seen.lock().unwrap().is_empty());
}
