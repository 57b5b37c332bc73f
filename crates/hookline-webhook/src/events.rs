//! Lifecycle notifications emitted by a webhook.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use hookline_message::Message;
use strum::IntoStaticStr;

use crate::{Error, RetryAfter};

/// Tracing target for event emission.
const TRACING_TARGET: &str = "hookline_webhook::events";

/// A lifecycle notification.
#[derive(Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum WebhookEvent {
    /// The retry queue drained completely.
    QueueEmpty {
        /// Messages delivered from the queue since it was last empty.
        sent: usize,
    },
    /// A delivery was answered with 429 and is about to be queued.
    RateLimited {
        /// The wait interpreted from the response.
        retry_after: RetryAfter,
    },
    /// A queued message failed for good while draining.
    ErrorOnDequeue {
        /// The failure.
        error: Error,
        /// The message that was dropped.
        message: Message,
    },
}

impl WebhookEvent {
    /// Returns the event name.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Callback invoked for every emitted event.
pub type Listener = Arc<dyn Fn(&WebhookEvent) + Send + Sync>;

/// Handle returned by [`Listeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of event listeners.
///
/// Listeners run synchronously on the emitting task, in registration order,
/// and all of them have returned before the emitter continues. A listener may
/// subscribe or unsubscribe others; changes apply from the next event.
#[derive(Clone, Default)]
pub struct Listeners {
    entries: Arc<RwLock<Vec<(ListenerId, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for all events.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&WebhookEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every registered listener with the event.
    pub fn emit(&self, event: &WebhookEvent) {
        let snapshot: Vec<Listener> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::trace!(
            target: TRACING_TARGET,
            event = event.name(),
            listeners = snapshot.len(),
            "Emitting webhook event"
        );

        for listener in snapshot {
            listener(event);
        }
    }
}
