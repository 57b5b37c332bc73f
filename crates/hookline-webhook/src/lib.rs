#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod events;
mod outcome;
mod queue;
mod service;
mod webhook;

pub mod rate_limit;
pub mod request;
pub mod response;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use config::{FALLBACK_IMAGE_URL_ENV, WEBHOOK_URL_ENV, WebhookConfig};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use events::{Listener, ListenerId, Listeners, WebhookEvent};
pub use hookline_message as message;
pub use outcome::SendOutcome;
pub use queue::QueueState;
pub use rate_limit::{DEFAULT_RETRY_AFTER, RetryAfter, RetryAfterSource};
pub use request::WebhookRequest;
pub use response::WebhookResponse;
pub use service::WebhookService;
pub use webhook::Webhook;

/// Tracing target for webhook operations.
pub const TRACING_TARGET: &str = "hookline_webhook";

/// Transport that performs a single HTTP delivery.
///
/// Implementations post the request once and report any HTTP response,
/// whatever its status, as `Ok`. Only failures without a response are
/// returned as errors. Retrying is left to [`Webhook`].
#[async_trait::async_trait]
pub trait WebhookProvider: Send + Sync {
    /// Delivers a payload to the request's endpoint.
    async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse>;
}
