use std::sync::atomic::{AtomicU64, Ordering};

use dagforge_core::SubscriberId;
use tokio::sync::broadcast;

use crate::event::Event;
use crate::filter::Filter;

/// Broadcast-based event bus. Events are fire-and-forget projections of
/// state already durably recorded — dropping one because no subscriber is
/// listening, or because a lagging subscriber missed it, is acceptable;
/// `GET`-ing the execution is always the source of truth.
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    emitted: AtomicU64,
}

impl EventBus {
    /// `capacity` bounds how many unconsumed events the channel retains
    /// per subscriber before the oldest are dropped and the subscriber
    /// observes a lag (surfaced here as silently-skipped events — the bus
    /// is best-effort and never blocks the publisher).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
        }
    }

    /// Publish an event to every subscriber whose filter matches. Never
    /// blocks: a full channel drops the oldest buffered event for that
    /// subscriber rather than backpressuring the scheduler.
    pub fn publish(&self, event: Event) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.send(event);
    }

    /// Register a new subscription with the given filter.
    pub fn subscribe(&self, filter: Filter) -> Subscription {
        Subscription {
            id: SubscriberId::new(uuid::Uuid::new_v4().to_string()).expect("uuid v4 string is always a valid key"),
            filter,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn total_published(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// A live subscription. Dropping it unsubscribes — the bus holds no
/// reference back to it, and `broadcast`'s own bookkeeping drops a
/// subscriber's slot once its receiver is gone.
pub struct Subscription {
    id: SubscriberId,
    filter: Filter,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    /// Wait for the next event matching this subscription's filter.
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive, for test assertions and polling consumers.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use dagforge_core::{ExecutionId, Value, WorkflowId};

    fn event(execution_id: ExecutionId, workflow_id: WorkflowId) -> Event {
        Event::new(EventKind::NodeStarted, execution_id, workflow_id, None, Value::Null)
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(event(ExecutionId::v4(), WorkflowId::v4()));
        assert_eq!(bus.total_published(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_with_matching_filter_receives_event() {
        let bus = EventBus::new(16);
        let execution_id = ExecutionId::v4();
        let mut sub = bus.subscribe(Filter::Execution(execution_id));

        bus.publish(event(execution_id, WorkflowId::v4()));
        assert!(sub.try_recv().is_some());
    }

    #[test]
    fn subscriber_with_non_matching_filter_sees_nothing() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(Filter::Execution(ExecutionId::v4()));

        bus.publish(event(ExecutionId::v4(), WorkflowId::v4()));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn recv_awaits_a_matching_event() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(Filter::All);

        bus.publish(event(ExecutionId::v4(), WorkflowId::v4()));
        let event = sub.recv().await.expect("event delivered");
        assert_eq!(event.kind, EventKind::NodeStarted);
    }

    #[test]
    fn subscriber_count_reflects_active_subscriptions() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        let sub1 = bus.subscribe(Filter::All);
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new(16);
        let mut sub1 = bus.subscribe(Filter::All);
        let mut sub2 = bus.subscribe(Filter::All);

        bus.publish(event(ExecutionId::v4(), WorkflowId::v4()));
        assert!(sub1.try_recv().is_some());
        assert!(sub2.try_recv().is_some());
    }
}
