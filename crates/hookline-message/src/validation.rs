//! Lenient validation helpers used while building payloads.

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use url::Url;

use crate::TRACING_TARGET;

/// Returns the input unchanged if it parses as an absolute URL.
pub fn validate_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }

    match Url::parse(url) {
        Ok(_) => Some(url.to_owned()),
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET,
                url,
                error = %error,
                "Dropping invalid url"
            );
            None
        }
    }
}

/// Parses an RFC 3339 timestamp, or a civil date-time interpreted as UTC.
pub fn validate_timestamp(value: &str) -> Option<Timestamp> {
    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Some(timestamp);
    }

    let civil = value.parse::<DateTime>().ok()?;
    civil.to_zoned(TimeZone::UTC).ok().map(|zoned| zoned.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url("https://picsum.photos/200").as_deref(),
            Some("https://picsum.photos/200")
        );
        assert!(validate_url("not a url").is_none());
        assert!(validate_url("").is_none());
        assert!(validate_url("/relative/path").is_none());
    }

    #[test]
    fn test_validate_url_keeps_input_verbatim() {
        let url = "HTTPS://Example.com";
        assert_eq!(validate_url(url).as_deref(), Some(url));
    }

    #[test]
    fn test_validate_timestamp() {
        let timestamp = validate_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(timestamp.as_second(), 1_709_296_200);

        let civil = validate_timestamp("2024-03-01T12:30:00").unwrap();
        assert_eq!(civil, timestamp);

        assert!(validate_timestamp("not a date").is_none());
    }
}
