//! Reqwest-based HTTP client for webhook delivery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;

use super::{Error, ReqwestConfig, TRACING_TARGET};
use crate::response::TOO_MANY_REQUESTS;
use crate::{WebhookProvider, WebhookRequest, WebhookResponse, WebhookService};

/// Response bodies are kept up to this many characters, except for 429s.
pub const MAX_BODY_CHARS: usize = 1024;

/// Truncates the body of anything but a throttling response.
fn clip_body(status_code: u16, body: String) -> String {
    if status_code == TOO_MANY_REQUESTS || body.chars().count() <= MAX_BODY_CHARS {
        return body;
    }
    body.chars().take(MAX_BODY_CHARS).collect()
}

struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Posts messages as JSON and reports the status, headers and body of
/// whatever the endpoint answers, including error statuses.
///
/// Only failures that produce no response at all (connect errors, timeouts)
/// are returned as errors.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> crate::Result<Self> {
        let timeout = config.timeout();
        let user_agent = config.user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            user_agent = %user_agent,
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            inner: Arc::new(ReqwestClientInner { http, config }),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`WebhookService`].
    pub fn into_service(self) -> WebhookService {
        WebhookService::new(self)
    }
}

#[async_trait::async_trait]
impl WebhookProvider for ReqwestClient {
    async fn deliver(&self, request: &WebhookRequest) -> crate::Result<WebhookResponse> {
        let started_at = Instant::now();

        let mut http_request = self
            .inner
            .http
            .post(request.url.as_str())
            .json(&request.payload);

        if let Some(timeout) = request.timeout {
            http_request = http_request.timeout(timeout);
        }

        for (name, value) in &request.headers {
            http_request = http_request.header(name, value);
        }

        let http_response = http_request.send().await.map_err(Error::from)?;
        let status_code = http_response.status().as_u16();

        let headers: HashMap<String, String> = http_response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_owned())))
            .collect();

        let body = http_response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .map(|body| clip_body(status_code, body));

        let elapsed = started_at.elapsed();
        let mut response = WebhookResponse::new(request.request_id, status_code)
            .with_duration(elapsed)
            .with_headers(headers);
        if let Some(body) = body {
            response = response.with_body(body);
        }

        tracing::trace!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            status_code,
            elapsed_ms = elapsed.as_millis(),
            "Received webhook response"
        );

        Ok(response)
    }
}
