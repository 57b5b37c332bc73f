//! Webhook configuration.

#[cfg(feature = "config")]
use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Environment variable holding the endpoint URL.
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";

/// Environment variable holding the fallback image URL.
pub const FALLBACK_IMAGE_URL_ENV: &str = "FALLBACK_IMAGE_URL";

/// Configuration of a single webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WebhookConfig {
    /// Webhook endpoint URL
    #[cfg_attr(feature = "config", arg(long = "webhook-url", env = "WEBHOOK_URL"))]
    pub url: Url,

    /// Return delivery failures as errors instead of an `error` outcome
    #[cfg_attr(
        feature = "config",
        arg(
            long = "propagate-errors",
            env = "WEBHOOK_PROPAGATE_ERRORS",
            default_value_t = true,
            action = ArgAction::Set
        )
    )]
    #[serde(default = "default_true")]
    pub propagate_errors: bool,

    /// Queue throttled messages and retry them after the advertised wait
    #[cfg_attr(
        feature = "config",
        arg(
            long = "retry-on-limit",
            env = "WEBHOOK_RETRY_ON_LIMIT",
            default_value_t = true,
            action = ArgAction::Set
        )
    )]
    #[serde(default = "default_true")]
    pub retry_on_limit: bool,

    /// Image used by embeds that set none
    #[cfg_attr(
        feature = "config",
        arg(long = "fallback-image-url", env = "FALLBACK_IMAGE_URL")
    )]
    #[serde(default)]
    pub fallback_image_url: Option<Url>,
}

fn default_true() -> bool {
    true
}

impl WebhookConfig {
    /// Creates a configuration that propagates errors and retries on 429.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            propagate_errors: true,
            retry_on_limit: true,
            fallback_image_url: None,
        }
    }

    /// Parses the endpoint URL and creates a default configuration.
    pub fn parse(url: &str) -> Result<Self> {
        let config = Self::new(Url::parse(url)?);
        config.validate()?;
        Ok(config)
    }

    /// Reads `WEBHOOK_URL` and `FALLBACK_IMAGE_URL` from the environment.
    ///
    /// An unparsable fallback image is ignored.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(WEBHOOK_URL_ENV).map_err(|e| {
            Error::from_source(crate::ErrorKind::Configuration, e)
                .with_message(format!("{WEBHOOK_URL_ENV} is not set"))
        })?;

        let fallback_image_url = std::env::var(FALLBACK_IMAGE_URL_ENV)
            .ok()
            .and_then(|value| match Url::parse(&value) {
                Ok(url) => Some(url),
                Err(error) => {
                    tracing::warn!(
                        target: crate::TRACING_TARGET,
                        error = %error,
                        "Ignoring invalid {FALLBACK_IMAGE_URL_ENV}"
                    );
                    None
                }
            });

        Ok(Self::parse(&url)?.with_fallback_image_url(fallback_image_url))
    }

    /// Checks that the endpoint is an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        match self.url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::configuration()
                .with_message(format!("Unsupported webhook url scheme: {scheme}"))),
        }
    }

    /// Sets whether delivery failures are returned as errors.
    #[must_use]
    pub fn with_propagate_errors(mut self, propagate_errors: bool) -> Self {
        self.propagate_errors = propagate_errors;
        self
    }

    /// Sets whether throttled messages are queued for retry.
    #[must_use]
    pub fn with_retry_on_limit(mut self, retry_on_limit: bool) -> Self {
        self.retry_on_limit = retry_on_limit;
        self
    }

    /// Sets the image used by embeds that have none.
    #[must_use]
    pub fn with_fallback_image_url(mut self, fallback_image_url: Option<Url>) -> Self {
        self.fallback_image_url = fallback_image_url;
        self
    }
}
