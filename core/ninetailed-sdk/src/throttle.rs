//! Single-flight async throttle.
//!
//! At most one run of the task is in flight. Calls arriving while a run is
//! in flight collapse into a single pending run that starts right after the
//! current one finishes; every caller merged into a run receives that run's
//! output.

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

type Task<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

struct State<T> {
    running: bool,
    current: Vec<oneshot::Sender<T>>,
    pending: Option<Vec<oneshot::Sender<T>>>,
}

/// Runs an async task with at most one execution in flight.
pub struct AsyncThrottle<T> {
    task: Task<T>,
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for AsyncThrottle<T> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> std::fmt::Debug for AsyncThrottle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncThrottle").finish_non_exhaustive()
    }
}

fn lock<T>(state: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl<T: Clone + Send + 'static> AsyncThrottle<T> {
    pub fn new<F>(task: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, T> + Send + Sync + 'static,
    {
        Self {
            task: Arc::new(task),
            state: Arc::new(Mutex::new(State {
                running: false,
                current: Vec::new(),
                pending: None,
            })),
        }
    }

    /// Requests a run and waits for the output of the run that serves it.
    ///
    /// Returns `None` if the driving task was cancelled, e.g. on runtime
    /// shutdown.
    pub async fn call(&self) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        let start_driver = {
            let mut state = lock(&self.state);
            if state.running {
                state.pending.get_or_insert_with(Vec::new).push(tx);
                false
            } else {
                state.running = true;
                state.current.push(tx);
                true
            }
        };

        if start_driver {
            tokio::spawn(Self::drive(Arc::clone(&self.task), Arc::clone(&self.state)));
        }
        rx.await.ok()
    }

    /// True while a run is in flight.
    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    async fn drive(task: Task<T>, state: Arc<Mutex<State<T>>>) {
        // Clears the state if the task panics or the driver is dropped
        // mid-run, so waiting callers observe cancellation.
        struct Reset<T>(Option<Arc<Mutex<State<T>>>>);
        impl<T> Drop for Reset<T> {
            fn drop(&mut self) {
                if let Some(state) = self.0.take() {
                    let mut state = lock(&state);
                    state.running = false;
                    state.current.clear();
                    state.pending = None;
                }
            }
        }
        let mut reset = Reset(Some(Arc::clone(&state)));

        loop {
            let output = task().await;

            let waiters = std::mem::take(&mut lock(&state).current);
            for waiter in waiters {
                let _ = waiter.send(output.clone());
            }

            let mut guard = lock(&state);
            match guard.pending.take() {
                Some(next) => guard.current = next,
                None => {
                    guard.running = false;
                    break;
                }
            }
        }

        reset.0 = None;
    }
}
