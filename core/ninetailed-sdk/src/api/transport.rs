//! Transport abstractions over the APIs.
//!
//! The flush and batching logic talk to these traits so they can run
//! against scripted transports in tests.

use super::client::NinetailedApiClient;
use super::error::ApiResult;
use super::types::{InsightsBatch, ProfileResponse};
use async_trait::async_trait;
use ninetailed_types::Event;

/// Delivers profile-affecting events.
#[async_trait]
pub trait ProfileTransport: Send + Sync {
    /// Applies `events` to the profile `profile_id`, or creates a profile.
    async fn upsert_profile(
        &self,
        profile_id: Option<&str>,
        events: &[Event],
    ) -> ApiResult<ProfileResponse>;
}

/// Delivers exposure telemetry.
#[async_trait]
pub trait InsightsTransport: Send + Sync {
    async fn send_event_batches(&self, batches: &[InsightsBatch]) -> ApiResult<()>;

    /// Fire-and-forget delivery. Returns `true` if the batches were handed off.
    fn send_beacon(&self, batches: Vec<InsightsBatch>) -> bool;
}

#[async_trait]
impl ProfileTransport for NinetailedApiClient {
    async fn upsert_profile(
        &self,
        profile_id: Option<&str>,
        events: &[Event],
    ) -> ApiResult<ProfileResponse> {
        NinetailedApiClient::upsert_profile(self, profile_id, events).await
    }
}

#[async_trait]
impl InsightsTransport for NinetailedApiClient {
    async fn send_event_batches(&self, batches: &[InsightsBatch]) -> ApiResult<()> {
        NinetailedApiClient::send_event_batches(self, batches).await
    }

    fn send_beacon(&self, batches: Vec<InsightsBatch>) -> bool {
        NinetailedApiClient::send_beacon(self, batches)
    }
}

/// Scripted transports for tests.
pub mod mock {
    use super::*;
    use crate::api::ApiError;
    use ninetailed_types::Profile;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// A profile upsert seen by [`MockProfileTransport`].
    #[derive(Debug, Clone)]
    pub struct UpsertCall {
        pub profile_id: Option<String>,
        pub events: Vec<Event>,
    }

    /// Answers upserts from a queue of scripted results.
    ///
    /// When the script is empty, every call succeeds with a profile whose
    /// id is the requested one (or `"generated"`). Clones share state.
    #[derive(Debug, Clone, Default)]
    pub struct MockProfileTransport {
        script: Arc<Mutex<VecDeque<ApiResult<ProfileResponse>>>>,
        calls: Arc<Mutex<Vec<UpsertCall>>>,
        latency: Option<Duration>,
    }

    impl MockProfileTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delays every response by `latency`.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub fn respond_with(&self, result: ApiResult<ProfileResponse>) {
            self.script.lock().unwrap().push_back(result);
        }

        pub fn fail_with(&self, error: ApiError) {
            self.respond_with(Err(error));
        }

        pub fn calls(&self) -> Vec<UpsertCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProfileTransport for MockProfileTransport {
        async fn upsert_profile(
            &self,
            profile_id: Option<&str>,
            events: &[Event],
        ) -> ApiResult<ProfileResponse> {
            self.calls.lock().unwrap().push(UpsertCall {
                profile_id: profile_id.map(str::to_string),
                events: events.to_vec(),
            });
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            let scripted = self.script.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| {
                let id = profile_id.unwrap_or("generated");
                Ok(ProfileResponse {
                    profile: Profile::new(id, id),
                    experiences: Vec::new(),
                    changes: Vec::new(),
                })
            })
        }
    }

    /// Records everything it is asked to deliver. Clones share state.
    #[derive(Debug, Clone, Default)]
    pub struct MockInsightsTransport {
        sent: Arc<Mutex<Vec<Vec<InsightsBatch>>>>,
        beacons: Arc<Mutex<Vec<Vec<InsightsBatch>>>>,
        failures: Arc<Mutex<VecDeque<ApiError>>>,
    }

    impl MockInsightsTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `send_event_batches` call fails with `error`.
        pub fn fail_next(&self, error: ApiError) {
            self.failures.lock().unwrap().push_back(error);
        }

        pub fn sent(&self) -> Vec<Vec<InsightsBatch>> {
            self.sent.lock().unwrap().clone()
        }

        pub fn beacons(&self) -> Vec<Vec<InsightsBatch>> {
            self.beacons.lock().unwrap().clone()
        }

        /// All events delivered by regular sends, in order.
        pub fn sent_events(&self) -> Vec<Event> {
            self.sent()
                .into_iter()
                .flatten()
                .flat_map(|b| b.events)
                .collect()
        }
    }

    #[async_trait]
    impl InsightsTransport for MockInsightsTransport {
        async fn send_event_batches(&self, batches: &[InsightsBatch]) -> ApiResult<()> {
            self.sent.lock().unwrap().push(batches.to_vec());
            match self.failures.lock().unwrap().pop_front() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn send_beacon(&self, batches: Vec<InsightsBatch>) -> bool {
            self.beacons.lock().unwrap().push(batches);
            true
        }
    }
}
