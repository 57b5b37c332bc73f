//! Interpretation of throttling responses.
//!
//! A response is throttling iff its status is 429. The wait before the next
//! attempt comes from, in order:
//!
//! 1. a numeric `retry_after` field in the JSON body (seconds, may be fractional),
//! 2. the `retry-after` header as whole seconds,
//! 3. [`DEFAULT_RETRY_AFTER`].
//!
//! Missing, malformed or non-positive hints fall through to the next source.

use std::time::Duration;

use serde::Deserialize;
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::WebhookResponse;

/// Wait used when a throttling response carries no usable hint.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Header carrying the server's wait hint.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Where a wait duration was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RetryAfterSource {
    Body,
    Header,
    Fallback,
}

/// How long to wait before retrying a throttled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter {
    pub wait: Duration,
    pub source: RetryAfterSource,
}

impl RetryAfter {
    /// Extracts the wait hint from a throttling response.
    pub fn from_response(response: &WebhookResponse) -> Self {
        if let Some(wait) = response.body.as_deref().and_then(parse_body) {
            return Self {
                wait,
                source: RetryAfterSource::Body,
            };
        }

        if let Some(wait) = response.header(RETRY_AFTER_HEADER).and_then(parse_header) {
            return Self {
                wait,
                source: RetryAfterSource::Header,
            };
        }

        Self::fallback()
    }

    /// The fixed wait used without any hint.
    pub const fn fallback() -> Self {
        Self {
            wait: DEFAULT_RETRY_AFTER,
            source: RetryAfterSource::Fallback,
        }
    }
}

/// Result of interpreting a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The endpoint is throttling; retry after the given wait.
    Throttled(RetryAfter),
    /// Any other failure. Not retried.
    Rejected,
}

/// Classifies a non-success response.
pub fn classify(response: &WebhookResponse) -> Classification {
    if response.is_rate_limited() {
        Classification::Throttled(RetryAfter::from_response(response))
    } else {
        Classification::Rejected
    }
}

#[derive(Deserialize)]
struct ThrottleBody {
    retry_after: Option<f64>,
}

fn parse_body(body: &str) -> Option<Duration> {
    let seconds = serde_json::from_str::<ThrottleBody>(body).ok()?.retry_after?;
    if seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Reads the leading digits of the header, ignoring any trailing text.
fn parse_header(value: &str) -> Option<Duration> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());

    let seconds: u64 = value[..end].parse().ok()?;
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn throttled() -> WebhookResponse {
        WebhookResponse::new(Uuid::now_v7(), 429)
    }

    #[test]
    fn test_body_wins_over_header() {
        let response = throttled()
            .with_body(r#"{"retry_after": 2}"#)
            .with_header("retry-after", "5");

        let retry_after = RetryAfter::from_response(&response);
        assert_eq!(retry_after.wait, Duration::from_secs(2));
        assert_eq!(retry_after.source, RetryAfterSource::Body);
    }

    #[test]
    fn test_header_only() {
        let response = throttled().with_header("Retry-After", "7");

        let retry_after = RetryAfter::from_response(&response);
        assert_eq!(retry_after.wait, Duration::from_secs(7));
        assert_eq!(retry_after.source, RetryAfterSource::Header);
    }

    #[test]
    fn test_fallback_without_hints() {
        assert_eq!(RetryAfter::from_response(&throttled()), RetryAfter::fallback());
        assert_eq!(RetryAfter::fallback().wait, Duration::from_secs(30));
    }

    #[test]
    fn test_fractional_body_value() {
        let response = throttled().with_body(r#"{"message": "You are being rate limited.", "retry_after": 0.75, "global": false}"#);

        assert_eq!(
            RetryAfter::from_response(&response).wait,
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_malformed_body_falls_through_to_header() {
        for body in ["not json", r#"{"retry_after": "soon"}"#, r#"{"other": 1}"#, "[]"] {
            let response = throttled().with_body(body).with_header("retry-after", "3");
            let retry_after = RetryAfter::from_response(&response);
            assert_eq!(retry_after.wait, Duration::from_secs(3), "body: {body}");
            assert_eq!(retry_after.source, RetryAfterSource::Header);
        }
    }

    #[test]
    fn test_zero_hints_fall_through() {
        let response = throttled()
            .with_body(r#"{"retry_after": 0}"#)
            .with_header("retry-after", "0");

        assert_eq!(RetryAfter::from_response(&response), RetryAfter::fallback());
    }

    #[test]
    fn test_header_parsing() {
        assert_eq!(parse_header("12"), Some(Duration::from_secs(12)));
        assert_eq!(parse_header(" 4 "), Some(Duration::from_secs(4)));
        assert_eq!(parse_header("5.9"), Some(Duration::from_secs(5)));
        assert_eq!(parse_header("soon"), None);
        assert_eq!(parse_header("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_header("-3"), None);
    }

    #[test]
    fn test_classify() {
        let response = throttled().with_header("retry-after", "1");
        assert_eq!(
            classify(&response),
            Classification::Throttled(RetryAfter {
                wait: Duration::from_secs(1),
                source: RetryAfterSource::Header,
            })
        );

        assert_eq!(
            classify(&WebhookResponse::new(Uuid::now_v7(), 500)),
            Classification::Rejected
        );
        assert_eq!(
            classify(&WebhookResponse::new(Uuid::now_v7(), 404)),
            Classification::Rejected
        );
    }
}
