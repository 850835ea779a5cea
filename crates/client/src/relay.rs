//! Bitmap relay coordination.
//!
//! The client keeps no canvas state of its own. A peer that asks it for
//! the current bitmap is recorded as *owed*, the bitmap is requested from
//! some other live peer, and whatever that peer answers is forwarded to
//! everyone owed at that moment. A request-forwarding proxy, not a cache:
//! there is nothing to go stale, but there may be nobody to ask.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::roster::Roster;

/// Tracks which peers are owed a bitmap and picks sources to ask.
#[derive(Debug, Default)]
pub struct BitmapRelay {
    owed: VecDeque<String>,
}

impl BitmapRelay {
    /// Create a relay with nobody owed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `requester` as owed and pick a peer to source the bitmap from.
    ///
    /// The requester itself is never asked. Returns the chosen source, or
    /// `None` when no other peer is available. The requester stays owed
    /// either way, and no retry is scheduled; only a later request or an
    /// arriving bitmap can resolve the debt.
    pub fn on_requested(&mut self, requester: &str, roster: &Roster) -> Option<String> {
        debug!("{requester} requested a bitmap");
        self.owed.push_back(requester.to_string());

        let source = roster.pick_random(&[requester]).map(str::to_string);
        match &source {
            Some(peer) => debug!("attempting to obtain bitmap from {peer}"),
            None => warn!("unable to obtain a bitmap for {requester}: no peer to ask"),
        }
        source
    }

    /// Take every owed peer, in FIFO order, clearing the queue entirely.
    ///
    /// Called when a bitmap payload arrives; each returned peer gets its
    /// own point-to-point delivery. A peer that asked more than once
    /// appears more than once and is delivered to that many times.
    pub fn on_received(&mut self) -> Vec<String> {
        self.owed.drain(..).collect()
    }

    /// Number of deliveries currently owed.
    pub fn owed(&self) -> usize {
        self.owed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_of(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for name in names {
            roster.add(name).expect("test names are plain");
        }
        roster
    }

    #[test]
    fn requester_is_owed_even_without_a_source() {
        let mut relay = BitmapRelay::new();
        let roster = roster_of(&["carol"]);

        // carol is the only peer and cannot be asked for her own request
        assert_eq!(relay.on_requested("carol", &roster), None);
        assert_eq!(relay.owed(), 1);
    }

    #[test]
    fn source_excludes_the_requester() {
        let mut relay = BitmapRelay::new();
        let roster = roster_of(&["alice", "bob"]);

        for _ in 0..20 {
            let source = relay
                .on_requested("alice", &roster)
                .expect("bob is available");
            assert_eq!(source, "bob");
        }
    }

    #[test]
    fn received_bitmap_drains_owed_in_fifo_order() {
        let mut relay = BitmapRelay::new();
        let roster = roster_of(&["p1", "p2", "p3", "src"]);

        relay.on_requested("p1", &roster);
        relay.on_requested("p2", &roster);
        relay.on_requested("p3", &roster);

        assert_eq!(relay.on_received(), ["p1", "p2", "p3"]);
        assert_eq!(relay.owed(), 0);
    }

    #[test]
    fn duplicate_requesters_are_preserved() {
        let mut relay = BitmapRelay::new();
        let roster = roster_of(&["alice", "bob"]);

        relay.on_requested("alice", &roster);
        relay.on_requested("alice", &roster);

        assert_eq!(relay.on_received(), ["alice", "alice"]);
    }
}
