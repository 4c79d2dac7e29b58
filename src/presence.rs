//! Presence surface: participant count and online state, mirrored off the
//! realtime channel. Read-only — nothing here feeds back into sync.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::types::ChannelEvent;

/// Folds channel events into a peer-identity set and a connection flag.
///
/// The identity set is the same user-id space the reconciliation controller
/// matches event actors against.
#[derive(Default)]
pub struct PresenceTracker {
    peers: Mutex<HashSet<String>>,
    online: Mutex<bool>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&self, event: &ChannelEvent) {
        match event {
            ChannelEvent::PeerJoined { user_id } => {
                self.peers.lock().insert(user_id.clone());
            }
            ChannelEvent::PeerLeft { user_id } => {
                self.peers.lock().remove(user_id);
            }
            // Position broadcasts announce identity the same as joins.
            ChannelEvent::PeerPosition { user_id, .. } => {
                self.peers.lock().insert(user_id.clone());
            }
            ChannelEvent::Connected => *self.online.lock() = true,
            ChannelEvent::Disconnected => {
                *self.online.lock() = false;
                self.peers.lock().clear();
            }
        }
    }

    /// Number of currently-announced peer identities.
    pub fn participant_count(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_online(&self) -> bool {
        *self.online.lock()
    }

    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.lock().iter().cloned().collect();
        peers.sort_unstable();
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_peers() {
        let tracker = PresenceTracker::new();
        tracker.handle_event(&ChannelEvent::PeerJoined { user_id: "a".into() });
        tracker.handle_event(&ChannelEvent::PeerJoined { user_id: "b".into() });
        tracker.handle_event(&ChannelEvent::PeerJoined { user_id: "a".into() });
        assert_eq!(tracker.participant_count(), 2);

        tracker.handle_event(&ChannelEvent::PeerLeft { user_id: "a".into() });
        assert_eq!(tracker.participant_count(), 1);
    }

    #[test]
    fn position_events_announce_identity() {
        let tracker = PresenceTracker::new();
        tracker.handle_event(&ChannelEvent::PeerPosition {
            user_id: "a".into(),
            field: "summary".into(),
        });
        assert_eq!(tracker.peers(), vec!["a".to_string()]);
    }

    #[test]
    fn connection_state_follows_channel() {
        let tracker = PresenceTracker::new();
        assert!(!tracker.is_online());
        tracker.handle_event(&ChannelEvent::Connected);
        assert!(tracker.is_online());

        tracker.handle_event(&ChannelEvent::PeerJoined { user_id: "a".into() });
        tracker.handle_event(&ChannelEvent::Disconnected);
        assert!(!tracker.is_online());
        // Disconnecting forgets announced peers
        assert_eq!(tracker.participant_count(), 0);
    }
}
