//! reqwest-based client for the experience and insights APIs.

use super::error::{ApiError, ApiResult};
use super::types::{Envelope, InsightsBatch, ProfileRequest, ProfileResponse, RequestOptions};
use crate::config::NinetailedConfig;
use ninetailed_types::Event;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Client for profile upserts and insights delivery.
///
/// Every request uses the configured timeout. 503 responses are retried up
/// to `retries` times with exponential backoff; timeouts and any other
/// non-2xx status are terminal.
#[derive(Debug, Clone)]
pub struct NinetailedApiClient {
    client: Client,
    client_id: String,
    environment: String,
    url: String,
    insights_url: String,
    retries: u32,
    min_retry_timeout: Duration,
    plaintext: bool,
    locale: Option<String>,
    features: Vec<String>,
}

impl NinetailedApiClient {
    pub fn new(config: &NinetailedConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            environment: config.environment.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            insights_url: config.insights_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            min_retry_timeout: config.min_retry_timeout(),
            plaintext: config.plaintext,
            locale: config.locale.clone(),
            features: config.enabled_features.clone(),
        })
    }

    fn profiles_url(&self, profile_id: Option<&str>) -> String {
        let base = format!(
            "{}/v2/organizations/{}/environments/{}/profiles",
            self.url, self.client_id, self.environment
        );
        match profile_id {
            Some(id) => format!("{base}/{id}"),
            None => base,
        }
    }

    fn insights_events_url(&self) -> String {
        format!(
            "{}/v1/organizations/{}/environments/{}/events",
            self.insights_url, self.client_id, self.environment
        )
    }

    fn content_type(&self) -> &'static str {
        if self.plaintext {
            "text/plain"
        } else {
            "application/json"
        }
    }

    fn with_locale(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.locale {
            Some(locale) => request.query(&[("locale", locale)]),
            None => request,
        }
    }

    fn post(&self, url: &str, body: String) -> RequestBuilder {
        self.client
            .post(url)
            .header(CONTENT_TYPE, self.content_type())
            .body(body)
    }

    fn encode(&self, value: &impl Serialize) -> ApiResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Sends the request built by `build`, retrying on 503.
    async fn send_with_retry<F>(&self, build: F) -> ApiResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let response = match build().send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    warn!(attempt, "Ninetailed API request timed out");
                    return Err(ApiError::Timeout);
                }
                Err(e) => return Err(ApiError::Network(e.to_string())),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::SERVICE_UNAVAILABLE {
                if attempt <= self.retries {
                    let backoff = self
                        .min_retry_timeout
                        .saturating_mul(2u32.saturating_pow(attempt - 1));
                    debug!(attempt, backoff_ms = backoff.as_millis() as u64, "503 from API, retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(ApiError::ServiceUnavailable { attempts: attempt });
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
    }

    async fn read_profile(&self, response: Response) -> ApiResult<ProfileResponse> {
        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text)?;

        if envelope.has_error() {
            let message = envelope
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ApiError::Response(message));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Response("response carried no data".to_string()))
    }

    async fn post_profile(&self, profile_id: Option<&str>, events: &[Event]) -> ApiResult<ProfileResponse> {
        let body = self.encode(&ProfileRequest {
            events: events.to_vec(),
            options: RequestOptions {
                features: self.features.clone(),
            },
        })?;
        let url = self.profiles_url(profile_id);

        debug!(events = events.len(), profile = ?profile_id, "Upserting profile");
        let response = self
            .send_with_retry(|| self.with_locale(self.post(&url, body.clone())))
            .await?;
        self.read_profile(response).await
    }

    /// Creates a new profile from `events`.
    pub async fn create_profile(&self, events: &[Event]) -> ApiResult<ProfileResponse> {
        self.post_profile(None, events).await
    }

    /// Applies `events` to an existing profile.
    pub async fn update_profile(&self, profile_id: &str, events: &[Event]) -> ApiResult<ProfileResponse> {
        self.post_profile(Some(profile_id), events).await
    }

    /// Updates the profile if an id is known, creates one otherwise.
    pub async fn upsert_profile(
        &self,
        profile_id: Option<&str>,
        events: &[Event],
    ) -> ApiResult<ProfileResponse> {
        match profile_id.filter(|id| !id.is_empty()) {
            Some(id) => self.update_profile(id, events).await,
            None => self.create_profile(events).await,
        }
    }

    pub async fn get_profile(&self, profile_id: &str) -> ApiResult<ProfileResponse> {
        let url = self.profiles_url(Some(profile_id));
        let response = self
            .send_with_retry(|| self.with_locale(self.client.get(&url)))
            .await?;
        self.read_profile(response).await
    }

    /// Delivers insights batches, with the same retry policy as profile calls.
    pub async fn send_event_batches(&self, batches: &[InsightsBatch]) -> ApiResult<()> {
        if batches.is_empty() {
            return Ok(());
        }
        let body = self.encode(&batches)?;
        let url = self.insights_events_url();

        debug!(batches = batches.len(), "Sending insights batches");
        self.send_with_retry(|| self.post(&url, body.clone())).await?;
        Ok(())
    }

    /// Fire-and-forget delivery for page teardown.
    ///
    /// Returns `true` if the request was handed off. The response is never
    /// inspected and nothing is retried.
    pub fn send_beacon(&self, batches: Vec<InsightsBatch>) -> bool {
        if batches.is_empty() {
            return true;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("cannot send beacon outside a tokio runtime");
            return false;
        };
        let body = match self.encode(&batches) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "failed to encode beacon payload");
                return false;
            }
        };

        let request = self.post(&self.insights_events_url(), body);
        runtime.spawn(async move {
            if let Err(e) = request.send().await {
                debug!(error = %e, "beacon delivery failed");
            }
        });
        true
    }
}
