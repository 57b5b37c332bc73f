//! Retry queue state.
//!
//! Holds the throttled messages, the "drain scheduled" flag and the count of
//! messages delivered since the queue was last empty. The webhook keeps one
//! instance behind a mutex; every transition below is a single critical
//! section.

use std::collections::VecDeque;
use std::mem;

use hookline_message::Message;
use strum::{AsRefStr, Display, IntoStaticStr};

/// Observable state of the retry machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum QueueState {
    /// Nothing queued, no timer pending.
    Idle,
    /// A drain timer is pending.
    Armed,
    /// A drain pass is resending queued messages.
    Draining,
}

/// Result of starting a drain step.
#[derive(Debug)]
pub(crate) enum Pass {
    /// The oldest queued message, to be resent.
    Next(Message),
    /// The queue was empty; carries the number of messages drained since the
    /// previous empty state.
    Empty { sent: usize },
}

#[derive(Debug, Default)]
pub(crate) struct RetryQueue {
    messages: VecDeque<Message>,
    drain_scheduled: bool,
    draining: bool,
    sent: usize,
}

impl RetryQueue {
    /// Appends a throttled message.
    ///
    /// Returns true if the caller must arm the drain timer, which happens
    /// only when none is pending.
    pub fn enqueue(&mut self, message: Message) -> bool {
        self.messages.push_back(message);
        !mem::replace(&mut self.drain_scheduled, true)
    }

    /// Handles a fired drain timer.
    ///
    /// Returns true if the caller should start a pass. While a pass is
    /// already running the timer only clears the scheduled flag, so the
    /// running pass carries on instead of stopping for it.
    pub fn timer_fired(&mut self) -> bool {
        self.drain_scheduled = false;
        !self.draining
    }

    /// Starts a drain step: clears the scheduled flag and pops the head.
    ///
    /// When the queue is empty the sent counter is reported and reset.
    pub fn begin_pass(&mut self) -> Pass {
        self.drain_scheduled = false;
        match self.messages.pop_front() {
            Some(message) => {
                self.draining = true;
                Pass::Next(message)
            }
            None => {
                self.draining = false;
                Pass::Empty {
                    sent: mem::take(&mut self.sent),
                }
            }
        }
    }

    /// Records a successful resend.
    ///
    /// Returns true if the pass should continue, i.e. no timer was armed
    /// while the message was in flight.
    pub fn record_sent(&mut self) -> bool {
        self.sent += 1;
        self.continue_pass()
    }

    /// Returns true if the pass should continue after a resend that was not
    /// delivered, i.e. no timer is pending. Ends the pass otherwise.
    pub fn continue_pass(&mut self) -> bool {
        if self.drain_scheduled {
            self.draining = false;
            false
        } else {
            true
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_drain_scheduled(&self) -> bool {
        self.drain_scheduled
    }

    pub fn state(&self) -> QueueState {
        if self.draining {
            QueueState::Draining
        } else if self.drain_scheduled {
            QueueState::Armed
        } else {
            QueueState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_content(queue: &mut RetryQueue) -> Option<String> {
        match queue.begin_pass() {
            Pass::Next(message) => message.content().map(str::to_owned),
            Pass::Empty { .. } => None,
        }
    }

    #[test]
    fn test_only_first_enqueue_arms() {
        let mut queue = RetryQueue::default();
        assert_eq!(queue.state(), QueueState::Idle);

        assert!(queue.enqueue(Message::from("a")));
        assert!(!queue.enqueue(Message::from("b")));
        assert!(!queue.enqueue(Message::from("c")));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.state(), QueueState::Armed);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = RetryQueue::default();
        for content in ["a", "b", "c"] {
            queue.enqueue(Message::from(content));
        }

        assert_eq!(next_content(&mut queue).as_deref(), Some("a"));
        assert_eq!(queue.state(), QueueState::Draining);
        assert_eq!(next_content(&mut queue).as_deref(), Some("b"));
        assert_eq!(next_content(&mut queue).as_deref(), Some("c"));
        assert!(next_content(&mut queue).is_none());
        assert_eq!(queue.state(), QueueState::Idle);
    }

    #[test]
    fn test_sent_counter_resets_on_empty() {
        let mut queue = RetryQueue::default();
        queue.enqueue(Message::from("a"));
        queue.enqueue(Message::from("b"));

        for _ in 0..2 {
            assert!(matches!(queue.begin_pass(), Pass::Next(_)));
            assert!(queue.record_sent());
        }

        assert!(matches!(queue.begin_pass(), Pass::Empty { sent: 2 }));
        assert!(matches!(queue.begin_pass(), Pass::Empty { sent: 0 }));
    }

    #[test]
    fn test_pass_stops_when_timer_rearmed() {
        let mut queue = RetryQueue::default();
        queue.enqueue(Message::from("a"));
        queue.enqueue(Message::from("b"));

        assert!(matches!(queue.begin_pass(), Pass::Next(_)));
        // Another message is throttled while "a" is in flight.
        assert!(queue.enqueue(Message::from("c")));
        assert!(!queue.record_sent());
        assert_eq!(queue.state(), QueueState::Armed);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_timer_during_pass_does_not_start_another() {
        let mut queue = RetryQueue::default();
        queue.enqueue(Message::from("a"));
        assert!(queue.timer_fired());
        assert!(matches!(queue.begin_pass(), Pass::Next(_)));

        // "b" is throttled and its timer fires while "a" is in flight.
        assert!(queue.enqueue(Message::from("b")));
        assert!(!queue.timer_fired());
        assert!(!queue.is_drain_scheduled());
        assert_eq!(queue.state(), QueueState::Draining);

        // The running pass picks "b" up itself.
        assert!(queue.record_sent());
        assert_eq!(next_content(&mut queue).as_deref(), Some("b"));
    }

    #[test]
    fn test_timer_after_pass_paused_starts_pass() {
        let mut queue = RetryQueue::default();
        queue.enqueue(Message::from("a"));
        assert!(matches!(queue.begin_pass(), Pass::Next(_)));

        // "a" is throttled again, the pass stops for the new timer.
        assert!(queue.enqueue(Message::from("a")));
        assert!(!queue.continue_pass());
        assert_eq!(queue.state(), QueueState::Armed);
        assert!(queue.timer_fired());
    }

    #[test]
    fn test_pass_continues_after_failure() {
        let mut queue = RetryQueue::default();
        queue.enqueue(Message::from("a"));
        queue.enqueue(Message::from("b"));

        assert!(matches!(queue.begin_pass(), Pass::Next(_)));
        assert!(queue.continue_pass());
        assert_eq!(next_content(&mut queue).as_deref(), Some("b"));
    }
}
