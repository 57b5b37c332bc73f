//! Webhook delivery request.

use std::collections::HashMap;
use std::time::Duration;

use hookline_message::Message;
use url::Url;
use uuid::Uuid;

use crate::Result;

/// A single delivery attempt of a serialized message.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// The webhook endpoint URL.
    pub url: Url,
    /// The JSON body to deliver.
    pub payload: serde_json::Value,
    /// Custom headers to include in the request.
    pub headers: HashMap<String, String>,
    /// Optional request timeout (uses client default if not set).
    pub timeout: Option<Duration>,
}

impl WebhookRequest {
    /// Creates a new webhook request with a raw JSON payload.
    pub fn new(url: Url, payload: serde_json::Value) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            url,
            payload,
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Serializes a message into a request for the given endpoint.
    pub fn from_message(url: Url, message: &Message) -> Result<Self> {
        let payload = serde_json::to_value(message)?;
        Ok(Self::new(url, payload))
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a custom header to the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
