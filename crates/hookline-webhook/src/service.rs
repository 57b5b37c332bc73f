//! Provider wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{Result, TRACING_TARGET, WebhookProvider, WebhookRequest, WebhookResponse};

/// Shared handle to a [`WebhookProvider`] that logs every delivery.
///
/// Cloning is cheap; all clones use the same provider.
#[derive(Clone)]
pub struct WebhookService {
    inner: Arc<dyn WebhookProvider>,
}

impl fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookService").finish_non_exhaustive()
    }
}

impl WebhookService {
    /// Wraps a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: WebhookProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Posts the request once and returns whatever the endpoint answered.
    pub async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            url = %request.url,
            "Delivering message"
        );

        let result = self.inner.deliver(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(response) if response.is_success() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    status_code = response.status_code,
                    elapsed_ms = elapsed.as_millis(),
                    "Message delivered"
                );
            }
            Ok(response) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    status_code = response.status_code,
                    elapsed_ms = elapsed.as_millis(),
                    "Endpoint rejected message"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Message delivery error"
                );
            }
        }

        result
    }
}
