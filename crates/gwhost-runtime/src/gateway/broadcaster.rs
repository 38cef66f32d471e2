//! Gateway state broadcasting to UI subscribers.
//!
//! Holds the current state for pull-style queries and fans every accepted
//! transition out over a broadcast channel. A subscription starts with a
//! snapshot of the current state, so a late subscriber still sees where
//! the run is.

use std::sync::{PoisonError, RwLock};

use gwhost_core::{GatewayState, StateError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// Broadcast channel capacity for state transitions
const CHANNEL_CAPACITY: usize = 16;

/// Single-writer holder of the current gateway state.
pub struct StateBroadcaster {
    sender: broadcast::Sender<GatewayState>,
    current: RwLock<Option<GatewayState>>,
}

impl StateBroadcaster {
    /// Create a broadcaster with no state yet.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            current: RwLock::new(None),
        }
    }

    /// Make `next` current and notify subscribers.
    ///
    /// Rejects anything but none → `Starting` → `Ready | Failed`.
    pub fn publish(&self, next: GatewayState) -> Result<(), StateError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        if !next.can_follow(current.as_ref()) {
            return Err(StateError::IllegalTransition {
                from: current.as_ref().map_or("none", GatewayState::phase),
                to: next.phase(),
            });
        }

        debug!(state = %next, subscribers = %self.sender.receiver_count(), "Publishing gateway state");
        *current = Some(next.clone());
        // Sent under the write lock so subscribe() never sees a snapshot
        // and a replay of the same transition.
        let _ = self.sender.send(next);
        Ok(())
    }

    /// Latest published state, if any.
    pub fn current(&self) -> Option<GatewayState> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to state changes, starting from the current state.
    pub fn subscribe(&self) -> StateSubscription {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        StateSubscription {
            pending: current.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber's view of the state stream.
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) stops delivery.
#[derive(Debug)]
pub struct StateSubscription {
    pending: Option<GatewayState>,
    receiver: broadcast::Receiver<GatewayState>,
}

impl StateSubscription {
    /// State that was current when the subscription was taken.
    pub const fn snapshot(&self) -> Option<&GatewayState> {
        self.pending.as_ref()
    }

    /// Next state in order: the snapshot first, then live transitions.
    ///
    /// Returns `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<GatewayState> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped = %skipped, "State subscriber lagged, resuming at oldest retained");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for `Ready` or `Failed`.
    pub async fn wait_terminal(&mut self) -> Option<GatewayState> {
        while let Some(state) = self.recv().await {
            if state.is_terminal() {
                return Some(state);
            }
        }
        None
    }

    /// Stop receiving updates.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starting() -> GatewayState {
        GatewayState::starting(1, "/logs", "t")
    }

    fn ready() -> GatewayState {
        GatewayState::ready("127.0.0.1", 1, "/logs", "t")
    }

    #[tokio::test]
    async fn subscribers_see_transitions_in_order() {
        let hub = StateBroadcaster::new();
        let mut sub = hub.subscribe();
        assert!(sub.snapshot().is_none());

        hub.publish(starting()).unwrap();
        hub.publish(ready()).unwrap();

        assert_eq!(sub.recv().await, Some(starting()));
        assert_eq!(sub.recv().await, Some(ready()));
    }

    #[tokio::test]
    async fn late_subscriber_gets_current_state_first() {
        let hub = StateBroadcaster::new();
        hub.publish(starting()).unwrap();

        let mut sub = hub.subscribe();
        assert_eq!(sub.snapshot(), Some(&starting()));

        hub.publish(ready()).unwrap();
        assert_eq!(sub.recv().await, Some(starting()));
        assert_eq!(sub.recv().await, Some(ready()));
    }

    #[tokio::test]
    async fn wait_terminal_skips_starting() {
        let hub = StateBroadcaster::new();
        let mut sub = hub.subscribe();
        hub.publish(starting()).unwrap();
        hub.publish(ready()).unwrap();
        assert_eq!(sub.wait_terminal().await, Some(ready()));
    }

    #[test]
    fn illegal_transitions_are_rejected_and_state_kept() {
        let hub = StateBroadcaster::new();
        assert_eq!(
            hub.publish(ready()),
            Err(StateError::IllegalTransition {
                from: "none",
                to: "ready"
            })
        );

        hub.publish(starting()).unwrap();
        hub.publish(ready()).unwrap();
        assert!(hub.publish(GatewayState::failed(1, "/logs", "x", "t")).is_err());
        assert_eq!(hub.current(), Some(ready()));
    }

    #[test]
    fn unsubscribe_releases_receiver() {
        let hub = StateBroadcaster::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
    }
}
