//! Result of a single send call.

use strum::{AsRefStr, Display, IntoStaticStr};

/// What happened to a message handed to [`Webhook::send`].
///
/// [`Webhook::send`]: crate::Webhook::send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[must_use]
pub enum SendOutcome {
    /// Delivered on this call.
    Sent,
    /// Throttled; the message waits in the retry queue and is delivered later.
    Queued,
    /// Delivery failed and will not be retried.
    ///
    /// Only returned when the webhook does not propagate errors.
    Error,
}

impl SendOutcome {
    /// Returns true unless the message was dropped.
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Sent | Self::Queued)
    }
}
