//! Scripted in-memory provider for testing.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! hookline-webhook = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hookline_webhook::mock::{MockProvider, MockReply};
//!
//! let provider = MockProvider::new();
//! provider.push(MockReply::throttled(1));
//! provider.push(MockReply::ok());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::{Error, Result, WebhookProvider, WebhookRequest, WebhookResponse};

/// A canned answer for one delivery.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with an HTTP status.
    Status {
        status_code: u16,
        body: Option<String>,
        headers: Vec<(String, String)>,
        /// How long the delivery takes before the response arrives.
        delay: Duration,
    },
    /// Fail without a response, like a refused connection.
    NetworkError,
}

impl MockReply {
    /// `204 No Content`.
    pub fn ok() -> Self {
        Self::status(204)
    }

    pub fn status(status_code: u16) -> Self {
        Self::Status {
            status_code,
            body: None,
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    /// 429 with a `retry-after` header of the given seconds.
    pub fn throttled(retry_after_secs: u64) -> Self {
        Self::status(429).with_header("retry-after", retry_after_secs.to_string())
    }

    /// 429 with a JSON body carrying `retry_after` seconds.
    pub fn throttled_body(retry_after_secs: f64) -> Self {
        Self::status(429).with_body(format!(r#"{{"retry_after": {retry_after_secs}}}"#))
    }

    pub fn network_error() -> Self {
        Self::NetworkError
    }

    #[must_use]
    pub fn with_body(mut self, value: impl Into<String>) -> Self {
        if let Self::Status { body, .. } = &mut self {
            *body = Some(value.into());
        }
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Status { headers, .. } = &mut self {
            headers.push((name.into(), value.into()));
        }
        self
    }

    /// Holds the response back for `value`, measured on the tokio clock.
    #[must_use]
    pub fn with_delay(mut self, value: Duration) -> Self {
        if let Self::Status { delay, .. } = &mut self {
            *delay = value;
        }
        self
    }

    fn delay(&self) -> Duration {
        match self {
            Self::Status { delay, .. } => *delay,
            Self::NetworkError => Duration::ZERO,
        }
    }

    fn respond(self, request: &WebhookRequest) -> Result<WebhookResponse> {
        match self {
            Self::Status {
                status_code,
                body,
                headers,
                ..
            } => {
                let mut response = WebhookResponse::new(request.request_id, status_code);
                if let Some(body) = body {
                    response = response.with_body(body);
                }
                Ok(headers
                    .into_iter()
                    .fold(response, |response, (name, value)| {
                        response.with_header(name, value)
                    }))
            }
            Self::NetworkError => {
                Err(Error::network_error().with_message("Mock connection refused"))
            }
        }
    }
}

/// A delivery observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// When the delivery happened, on the tokio clock.
    pub at: Instant,
    pub request: WebhookRequest,
}

impl RecordedRequest {
    /// The `content` field of the payload, if any.
    pub fn content(&self) -> Option<&str> {
        self.request.payload.get("content")?.as_str()
    }
}

#[derive(Debug)]
struct MockState {
    script: VecDeque<MockReply>,
    fallback: MockReply,
    requests: Vec<RecordedRequest>,
}

/// Provider that answers from a script and records every request.
///
/// Replies are consumed in order; once the script runs out every delivery
/// gets the fallback reply, `204` unless changed. Clones share state.
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: VecDeque::new(),
                fallback: MockReply::ok(),
                requests: Vec::new(),
            })),
        }
    }

    /// Appends a reply to the script.
    pub fn push(&self, reply: MockReply) -> &Self {
        self.lock().script.push_back(reply);
        self
    }

    /// Appends the same reply `count` times.
    pub fn push_repeated(&self, reply: MockReply, count: usize) -> &Self {
        self.lock().script.extend(std::iter::repeat_n(reply, count));
        self
    }

    /// Replaces the reply used after the script is exhausted.
    pub fn set_fallback(&self, reply: MockReply) -> &Self {
        self.lock().fallback = reply;
        self
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// The `content` of every request seen so far, oldest first.
    pub fn contents(&self) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .filter_map(|recorded| recorded.content().map(str::to_owned))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl WebhookProvider for MockProvider {
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                at: Instant::now(),
                request: request.clone(),
            });
            let fallback = state.fallback.clone();
            state.script.pop_front().unwrap_or(fallback)
        };

        let delay = reply.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        reply.respond(request)
    }
}
