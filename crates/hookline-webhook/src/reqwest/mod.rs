//! Reqwest-based HTTP client for webhook delivery.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookline_webhook::reqwest::{ReqwestClient, ReqwestConfig};
//! use hookline_webhook::{Webhook, WebhookConfig};
//!
//! let client = ReqwestClient::new(ReqwestConfig::default().with_timeout(10))?;
//! let webhook = Webhook::new(WebhookConfig::parse(url)?, client);
//! ```

mod client;
mod config;
mod error;

pub use client::{MAX_BODY_CHARS, ReqwestClient};
pub use config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "hookline_webhook::reqwest";
