//! Decision correlation hubs.
//!
//! Two hubs sit over the shared [`LoginEventBus`]: one delivers acceptance
//! decisions, the other rejections. Each hub filters the stream twice -
//! by outcome kind and by transaction identity - so a subscriber sees only
//! the decisions that belong to its own transaction.
//!
//! Keeping the two outcomes on separate hubs lets the verification step
//! register exactly the two subscriptions it needs and treat "first of
//! either fires" as the resolution signal, without inspecting a payload
//! discriminator.
//!
//! # Semantics
//!
//! - no buffering: a subscription only observes events published strictly
//!   after [`DecisionHub::subscribe_once`] returned
//! - exactly-once: [`DecisionSubscription::wait`] consumes the subscription
//!   on the first matching event
//! - dropping a subscription before delivery cancels it with no residual
//!   effect
//! - subscriptions for different transactions are independent; the hub
//!   never cross-delivers

use tokio::sync::broadcast::error::RecvError;

use crate::events::{LoginEvent, LoginEventBus};
use crate::transaction::TxId;

/// Which terminal outcome a hub delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// The login was accepted (`login:complete`).
    Accepted,
    /// The login was rejected (`login:rejected`).
    Rejected,
}

impl DecisionKind {
    fn matches(self, event: &LoginEvent) -> bool {
        matches!(
            (self, event),
            (DecisionKind::Accepted, LoginEvent::Complete { .. })
                | (DecisionKind::Rejected, LoginEvent::Rejected { .. })
        )
    }
}

/// A filtering subscription layer over the shared event source, fixed to
/// one outcome kind.
///
/// Hubs are cheap handles: a transaction hands one out per outcome, all
/// reading the same underlying bus.
#[derive(Debug, Clone)]
pub struct DecisionHub {
    kind: DecisionKind,
    bus: LoginEventBus,
}

impl DecisionHub {
    /// Create a hub for one outcome kind over the given event source.
    pub fn new(kind: DecisionKind, bus: LoginEventBus) -> Self {
        Self { kind, bus }
    }

    /// The outcome this hub delivers.
    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Subscribe for the next decision of this hub's kind belonging to
    /// `tx_id`.
    ///
    /// The returned subscription observes events published after this call.
    /// Drop it to unsubscribe.
    pub fn subscribe_once(&self, tx_id: TxId) -> DecisionSubscription {
        DecisionSubscription {
            kind: self.kind,
            tx_id,
            receiver: self.bus.subscribe(),
        }
    }
}

/// A one-shot, transaction-scoped subscription handed out by a hub.
pub struct DecisionSubscription {
    kind: DecisionKind,
    tx_id: TxId,
    receiver: tokio::sync::broadcast::Receiver<LoginEvent>,
}

impl DecisionSubscription {
    /// The transaction this subscription is scoped to.
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// Wait for the first matching decision, consuming the subscription.
    ///
    /// Returns `None` if the event source closes before a match arrives.
    /// Lagged receivers log a warning and keep reading; decisions observed
    /// while lagging are lost, which is the bus's at-most-once contract.
    pub async fn wait(mut self) -> Option<LoginEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.kind.matches(&event) && event.tx_id() == &self.tx_id {
                        return Some(event);
                    }
                }
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, tx_id = %self.tx_id, "decision receiver lagged");
                }
            }
        }
    }
}

impl std::fmt::Debug for DecisionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionSubscription")
            .field("kind", &self.kind)
            .field("tx_id", &self.tx_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn complete(tx: &str) -> LoginEvent {
        LoginEvent::Complete {
            tx_id: TxId::new(tx),
            signature: "sig".into(),
        }
    }

    fn rejected(tx: &str) -> LoginEvent {
        LoginEvent::Rejected {
            tx_id: TxId::new(tx),
        }
    }

    #[tokio::test]
    async fn test_delivers_matching_event() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        let subscription = hub.subscribe_once(TxId::new("tx-1"));
        bus.publish(complete("tx-1"));

        let event = subscription.wait().await.unwrap();
        assert_eq!(event.tx_id().as_str(), "tx-1");
        assert_eq!(event.signature(), Some("sig"));
    }

    #[tokio::test]
    async fn test_filters_other_transactions() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        let subscription = hub.subscribe_once(TxId::new("tx-mine"));
        bus.publish(complete("tx-other"));
        bus.publish(complete("tx-mine"));

        let event = subscription.wait().await.unwrap();
        assert_eq!(event.tx_id().as_str(), "tx-mine");
    }

    #[tokio::test]
    async fn test_filters_other_outcome_kind() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Rejected, bus.clone());

        let subscription = hub.subscribe_once(TxId::new("tx-1"));
        bus.publish(complete("tx-1"));
        bus.publish(rejected("tx-1"));

        let event = subscription.wait().await.unwrap();
        assert!(matches!(event, LoginEvent::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_subscriptions_are_independent() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        let sub_a = hub.subscribe_once(TxId::new("tx-a"));
        let sub_b = hub.subscribe_once(TxId::new("tx-b"));

        bus.publish(complete("tx-b"));
        bus.publish(complete("tx-a"));

        assert_eq!(sub_a.wait().await.unwrap().tx_id().as_str(), "tx-a");
        assert_eq!(sub_b.wait().await.unwrap().tx_id().as_str(), "tx-b");
    }

    #[tokio::test]
    async fn test_no_events_before_subscription() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        bus.publish(complete("tx-1"));
        let subscription = hub.subscribe_once(TxId::new("tx-1"));

        let result = timeout(Duration::from_millis(50), subscription.wait()).await;
        assert!(result.is_err(), "must not observe events published earlier");
    }

    #[tokio::test]
    async fn test_drop_cancels_subscription() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        let subscription = hub.subscribe_once(TxId::new("tx-1"));
        assert_eq!(bus.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_returns_none_when_bus_closes() {
        let bus = LoginEventBus::new();
        let hub = DecisionHub::new(DecisionKind::Accepted, bus.clone());

        let subscription = hub.subscribe_once(TxId::new("tx-1"));
        drop(bus);
        drop(hub);

        assert!(subscription.wait().await.is_none());
    }
}
