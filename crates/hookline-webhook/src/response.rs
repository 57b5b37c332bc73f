//! Webhook delivery response types.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status code the endpoint uses to signal throttling.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// HTTP response received for a delivery attempt.
///
/// Transport failures that never produced a response are reported as
/// errors by the provider instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Unique identifier for this response.
    pub response_id: Uuid,
    /// Request ID this response corresponds to.
    pub request_id: Uuid,
    /// HTTP status code from the webhook endpoint.
    pub status_code: u16,
    /// Response body from the webhook endpoint. Large bodies are truncated
    /// unless the response is a 429, whose body carries the retry hint.
    pub body: Option<String>,
    /// Response headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// Response time in milliseconds.
    pub response_time_ms: Option<u64>,
}

impl WebhookResponse {
    /// Creates a new response with the given status code.
    pub fn new(request_id: Uuid, status_code: u16) -> Self {
        Self {
            response_id: Uuid::now_v7(),
            request_id,
            status_code,
            body: None,
            headers: HashMap::new(),
            response_time_ms: None,
        }
    }

    /// Sets the response time.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.response_time_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Sets the response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a response header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets multiple response headers.
    pub fn with_headers(self, headers: HashMap<String, String>) -> Self {
        headers
            .into_iter()
            .fold(self, |response, (name, value)| response.with_header(name, value))
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns whether the delivery was successful (2xx status code).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns whether the endpoint throttled this request.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == TOO_MANY_REQUESTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let request_id = Uuid::new_v4();
        let response = WebhookResponse::new(request_id, 204);

        assert!(response.is_success());
        assert!(!response.is_rate_limited());
        assert_eq!(response.request_id, request_id);
    }

    #[test]
    fn test_failure_responses() {
        assert!(!WebhookResponse::new(Uuid::new_v4(), 400).is_success());
        assert!(!WebhookResponse::new(Uuid::new_v4(), 500).is_success());

        let throttled = WebhookResponse::new(Uuid::new_v4(), 429);
        assert!(!throttled.is_success());
        assert!(throttled.is_rate_limited());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = WebhookResponse::new(Uuid::new_v4(), 429).with_header("Retry-After", "5");

        assert_eq!(response.header("retry-after"), Some("5"));
        assert_eq!(response.header("RETRY-AFTER"), Some("5"));
        assert!(response.header("x-missing").is_none());
    }

    #[test]
    fn test_response_with_duration() {
        let response =
            WebhookResponse::new(Uuid::new_v4(), 200).with_duration(Duration::from_millis(150));

        assert_eq!(response.response_time_ms, Some(150));
    }
}
