//! Decision events and the shared transaction-scoped event source.
//!
//! # Guarantees
//!
//! - **At-most-once delivery**: slow receivers may miss events
//! - **In-memory only**: events are not persisted
//! - **No replay**: a receiver only observes events published strictly
//!   after it subscribed
//!
//! The verification core never publishes here - it only subscribes.
//! [`LoginEventBus::publish`] exists for the layer that feeds server-pushed
//! events into the client (and for tests, which stand in for that layer).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::transaction::TxId;

/// Default channel capacity for the login event bus.
const DEFAULT_CAPACITY: usize = 64;

/// A decision pushed by the server for one login transaction.
///
/// The serde form matches the wire schema: the tag field is `event` with
/// values `login:complete` / `login:rejected`, and the transaction identity
/// travels as `txId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LoginEvent {
    /// The login was accepted; carries the signature issued for it.
    #[serde(rename = "login:complete")]
    Complete {
        /// Identity of the transaction this decision belongs to.
        #[serde(rename = "txId")]
        tx_id: TxId,
        /// Signature issued for the accepted login.
        signature: String,
    },

    /// The login was rejected. No signature.
    #[serde(rename = "login:rejected")]
    Rejected {
        /// Identity of the transaction this decision belongs to.
        #[serde(rename = "txId")]
        tx_id: TxId,
    },
}

impl LoginEvent {
    /// The transaction this decision belongs to.
    pub fn tx_id(&self) -> &TxId {
        match self {
            LoginEvent::Complete { tx_id, .. } | LoginEvent::Rejected { tx_id } => tx_id,
        }
    }

    /// The signature, present only on acceptance.
    pub fn signature(&self) -> Option<&str> {
        match self {
            LoginEvent::Complete { signature, .. } => Some(signature),
            LoginEvent::Rejected { .. } => None,
        }
    }
}

/// The shared event source all decision hubs of one client read from.
///
/// A thin wrapper over a broadcast channel: cloning shares the channel, so a
/// transaction, its hubs, and its steps all observe the same stream.
#[derive(Clone)]
pub struct LoginEventBus {
    sender: broadcast::Sender<LoginEvent>,
}

impl LoginEventBus {
    /// Create a new bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new bus with the specified capacity.
    ///
    /// The capacity determines how many events can be buffered before slow
    /// receivers start lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a decision event to all current subscribers.
    ///
    /// Returns the number of receivers that observed the event.
    pub fn publish(&self, event: LoginEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events on this bus.
    ///
    /// The receiver observes events published after this call; earlier
    /// events are never replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<LoginEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LoginEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoginEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginEventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
