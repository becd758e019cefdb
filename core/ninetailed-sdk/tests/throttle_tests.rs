use futures::FutureExt;
use ninetailed_sdk::AsyncThrottle;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counting_throttle(latency: Duration) -> (AsyncThrottle<usize>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let throttle = AsyncThrottle::new(move || {
        let counter = Arc::clone(&counter);
        async move {
            let run = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(latency).await;
            run
        }
        .boxed()
    });
    (throttle, runs)
}

// ── Single flight ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn single_call_runs_once() {
    let (throttle, runs) = counting_throttle(Duration::from_millis(10));
    assert_eq!(throttle.call().await, Some(1));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!throttle.is_running());
}

#[tokio::test(start_paused = true)]
async fn calls_during_a_run_merge_into_one_pending_run() {
    let (throttle, runs) = counting_throttle(Duration::from_millis(100));

    let first = tokio::spawn({
        let t = throttle.clone();
        async move { t.call().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(throttle.is_running());

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let t = throttle.clone();
            tokio::spawn(async move { t.call().await })
        })
        .collect();

    assert_eq!(first.await.unwrap(), Some(1));
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Some(2));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert!(!throttle.is_running());
}

#[tokio::test(start_paused = true)]
async fn sequential_calls_each_run() {
    let (throttle, runs) = counting_throttle(Duration::from_millis(5));
    for expected in 1..=3 {
        assert_eq!(throttle.call().await, Some(expected));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn simultaneous_callers_share_the_first_run() {
    let (throttle, runs) = counting_throttle(Duration::from_millis(50));
    let (a, b) = tokio::join!(throttle.call(), throttle.call());
    assert_eq!(a, Some(1));
    assert_eq!(b, Some(2));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}
