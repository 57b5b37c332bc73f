//! Webhook sender with rate-limit aware retry queueing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use hookline_message::{Embed, Message};

use crate::queue::{Pass, RetryQueue};
use crate::rate_limit::{Classification, classify};
use crate::{
    Error, ListenerId, Listeners, QueueState, Result, RetryAfter, SendOutcome, TRACING_TARGET,
    WebhookConfig, WebhookEvent, WebhookProvider, WebhookRequest, WebhookService,
};

/// Outcome of one delivery attempt, before the error policy applies.
enum Attempt {
    Sent,
    Queued,
    Failed { error: Error, message: Message },
}

struct WebhookInner {
    config: WebhookConfig,
    service: WebhookService,
    queue: Mutex<RetryQueue>,
    listeners: Listeners,
}

/// Sender bound to a single webhook endpoint.
///
/// Messages throttled with `429` are queued and redelivered in arrival order
/// once the advertised wait has passed. At most one drain timer is pending at
/// any time. Cloning is cheap and clones share the queue and listeners.
///
/// Sending must happen inside a tokio runtime; the drain runs as a spawned
/// task on it.
#[derive(Clone)]
pub struct Webhook {
    inner: Arc<WebhookInner>,
}

impl std::fmt::Debug for Webhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhook")
            .field("url", &self.inner.config.url.as_str())
            .field("queued", &self.queued())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Webhook {
    /// Creates a webhook delivering through the given provider.
    pub fn new<P>(config: WebhookConfig, provider: P) -> Self
    where
        P: WebhookProvider + 'static,
    {
        Self::with_service(config, WebhookService::new(provider))
    }

    /// Creates a webhook delivering through an existing service.
    pub fn with_service(config: WebhookConfig, service: WebhookService) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.url,
            propagate_errors = config.propagate_errors,
            retry_on_limit = config.retry_on_limit,
            "Creating webhook"
        );

        Self {
            inner: Arc::new(WebhookInner {
                config,
                service,
                queue: Mutex::new(RetryQueue::default()),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Creates a webhook backed by the reqwest client with default settings.
    #[cfg(feature = "reqwest")]
    #[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
    pub fn from_config(config: WebhookConfig) -> Result<Self> {
        let client = crate::reqwest::ReqwestClient::new(crate::reqwest::ReqwestConfig::default())?;
        Ok(Self::new(config, client))
    }

    /// Creates a webhook for the URL that propagates errors and retries on 429.
    #[cfg(feature = "reqwest")]
    #[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
    pub fn from_url(url: &str) -> Result<Self> {
        Self::from_config(WebhookConfig::parse(url)?)
    }

    /// Returns the configuration this webhook was created with.
    pub fn config(&self) -> &WebhookConfig {
        &self.inner.config
    }

    /// Starts an embed that falls back to the configured image.
    pub fn embed(&self) -> Embed {
        Embed::new().with_fallback_image(self.inner.config.fallback_image_url.as_ref())
    }

    /// Sends a message.
    ///
    /// Returns [`SendOutcome::Queued`] when the endpoint throttled the
    /// message and retrying is enabled; delivery then happens in the
    /// background. Any other failure is returned as an error, or as
    /// [`SendOutcome::Error`] when the webhook does not propagate errors.
    pub async fn send(&self, message: impl Into<Message>) -> Result<SendOutcome> {
        let message = message.into();
        if message.is_empty() {
            return self.inner.settle(Error::empty_message());
        }

        match self.inner.attempt(message).await {
            Attempt::Sent => Ok(SendOutcome::Sent),
            Attempt::Queued => Ok(SendOutcome::Queued),
            Attempt::Failed { error, .. } => self.inner.settle(error),
        }
    }

    /// Registers a listener for every event.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&WebhookEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    /// Calls `listener` with the number of drained messages whenever the
    /// retry queue empties.
    pub fn on_queue_empty<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let WebhookEvent::QueueEmpty { sent } = event {
                listener(*sent);
            }
        })
    }

    /// Calls `listener` for every throttling response about to be queued.
    pub fn on_rate_limited<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RetryAfter) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let WebhookEvent::RateLimited { retry_after } = event {
                listener(retry_after);
            }
        })
    }

    /// Calls `listener` for every queued message dropped while draining.
    pub fn on_error_on_dequeue<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Error, &Message) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let WebhookEvent::ErrorOnDequeue { error, message } = event {
                listener(error, message);
            }
        })
    }

    /// Number of messages waiting for redelivery.
    pub fn queued(&self) -> usize {
        self.inner.lock_queue().len()
    }

    /// Returns true while a drain timer is pending.
    pub fn is_drain_scheduled(&self) -> bool {
        self.inner.lock_queue().is_drain_scheduled()
    }

    /// Returns whether the retry queue is idle, armed or draining.
    pub fn state(&self) -> QueueState {
        self.inner.lock_queue().state()
    }
}

impl WebhookInner {
    fn lock_queue(&self) -> MutexGuard<'_, RetryQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies the error policy to a terminal failure.
    fn settle(&self, error: Error) -> Result<SendOutcome> {
        if self.config.propagate_errors {
            return Err(error);
        }

        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            "Dropping message after failed delivery"
        );
        Ok(SendOutcome::Error)
    }

    /// Delivers one message and queues it if throttled.
    async fn attempt(self: &Arc<Self>, message: Message) -> Attempt {
        let request = match WebhookRequest::from_message(self.config.url.clone(), &message) {
            Ok(request) => request,
            Err(error) => return Attempt::Failed { error, message },
        };

        let response = match self.service.deliver(&request).await {
            Ok(response) => response,
            Err(error) => return Attempt::Failed { error, message },
        };

        if response.is_success() {
            return Attempt::Sent;
        }

        match classify(&response) {
            Classification::Throttled(retry_after) if self.config.retry_on_limit => {
                self.enqueue(message, retry_after);
                Attempt::Queued
            }
            Classification::Throttled(retry_after) => {
                let error = Error::rate_limited()
                    .with_status_code(response.status_code)
                    .with_message(format!(
                        "Rate limited, retry after {}ms",
                        retry_after.wait.as_millis()
                    ));
                Attempt::Failed { error, message }
            }
            Classification::Rejected => {
                let mut error = Error::delivery_failed(response.status_code);
                if let Some(body) = response.body {
                    error = error.with_context(body);
                }
                Attempt::Failed { error, message }
            }
        }
    }

    fn enqueue(self: &Arc<Self>, message: Message, retry_after: RetryAfter) {
        self.listeners
            .emit(&WebhookEvent::RateLimited { retry_after });

        let (arm, queued) = {
            let mut queue = self.lock_queue();
            let arm = queue.enqueue(message);
            (arm, queue.len())
        };

        tracing::info!(
            target: TRACING_TARGET,
            queued,
            wait_ms = retry_after.wait.as_millis(),
            source = %retry_after.source,
            arm,
            "Message rate limited, queued for retry"
        );

        if arm {
            tokio::spawn(drain(Arc::clone(self), retry_after.wait));
        }
    }

    /// Resends queued messages until the queue empties or a timer is armed.
    async fn drain_queue(self: &Arc<Self>) {
        loop {
            let pass = self.lock_queue().begin_pass();
            let message = match pass {
                Pass::Next(message) => message,
                Pass::Empty { sent } => {
                    tracing::info!(target: TRACING_TARGET, sent, "Retry queue drained");
                    self.listeners.emit(&WebhookEvent::QueueEmpty { sent });
                    return;
                }
            };

            let proceed = match self.attempt(message).await {
                Attempt::Sent => self.lock_queue().record_sent(),
                // The timer armed for the requeued message may already have
                // fired and deferred to this pass.
                Attempt::Queued => self.lock_queue().continue_pass(),
                Attempt::Failed { error, message } => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error = %error,
                        "Dropping queued message"
                    );
                    self.listeners
                        .emit(&WebhookEvent::ErrorOnDequeue { error, message });
                    self.lock_queue().continue_pass()
                }
            };

            if !proceed {
                tracing::debug!(target: TRACING_TARGET, "Drain paused until next timer");
                return;
            }
        }
    }
}

/// Waits out the throttle and then drains the queue.
///
/// Boxed because draining may arm a new timer, which spawns this future again.
fn drain(inner: Arc<WebhookInner>, wait: Duration) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        tokio::time::sleep(wait).await;

        if !inner.lock_queue().timer_fired() {
            tracing::debug!(target: TRACING_TARGET, "Drain timer fired during a pass");
            return;
        }

        tracing::debug!(target: TRACING_TARGET, "Drain timer fired");
        inner.drain_queue().await;
    })
}
